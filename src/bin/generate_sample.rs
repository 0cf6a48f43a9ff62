use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let regions = ["North", "South", "East", "West"];
    let channels = ["Online", "Store", "Partner"];
    let products = ["Widget", "Gadget", "Gizmo", "Doohickey", "Sprocket"];
    let base_price = [12.5, 30.0, 7.25, 55.0, 18.0];

    let start = NaiveDate::from_ymd_opt(2024, 1, 1).context("invalid start date")?;

    let output_path = "sample_sales.csv";
    let mut writer = csv::Writer::from_path(output_path).context("creating output file")?;
    writer.write_record(["order_date", "region", "channel", "product", "units", "unit_price", "sales"])?;

    let mut rows = 0;
    for day in 0..366 {
        let date = start + Duration::days(day);
        // Weekends are busier
        let orders = if date.weekday().number_from_monday() >= 6 { 6 } else { 3 };
        for _ in 0..orders {
            let product_idx = (rng.next_u64() % products.len() as u64) as usize;
            let units = rng.gauss(8.0, 3.0).round().max(1.0) as i64;
            let price = base_price[product_idx] * (1.0 + rng.gauss(0.0, 0.05));
            writer.write_record([
                date.format("%Y-%m-%d").to_string(),
                rng.pick(&regions).to_string(),
                rng.pick(&channels).to_string(),
                products[product_idx].to_string(),
                units.to_string(),
                format!("{price:.2}"),
                format!("{:.2}", price * units as f64),
            ])?;
            rows += 1;
        }
    }
    writer.flush()?;

    println!("Wrote {rows} orders to {output_path}");
    Ok(())
}
