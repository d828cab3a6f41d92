use std::path::PathBuf;

use serde_json::json;

use plastispec::data::catalog::REQUIRED_COLUMNS;
use plastispec::data::spectrum::spectrum_hash;

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

fn generate_signal(
    x: &[f64],
    peaks: &[(f64, f64, f64)],
    noise_level: f64,
    rng: &mut SimpleRng,
) -> Vec<f64> {
    x.iter()
        .map(|&xi| {
            let signal: f64 = peaks
                .iter()
                .map(|&(mu, sigma, amp)| gaussian(xi, mu, sigma, amp))
                .sum();
            signal + rng.gauss(0.0, noise_level)
        })
        .collect()
}

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
}

struct Region {
    code: &'static str,
    description: &'static str,
    country: &'static str,
    lat: f64,
    lon: f64,
}

const REGIONS: &[Region] = &[
    Region {
        code: "VLFR",
        description: "Villefranche-sur-Mer",
        country: "France",
        lat: 43.682,
        lon: 7.309,
    },
    Region {
        code: "NAP",
        description: "Naples",
        country: "Italy",
        lat: 40.836,
        lon: 14.306,
    },
    Region {
        code: "LCG",
        description: "A Coruna / Ares Harbour",
        country: "Spain",
        lat: 43.426,
        lon: -8.244,
    },
];

// (Polymer, short code, Product_ID, Supplier, Specifications, peak positions in cm-1)
const POLYMERS: &[(&str, &str, &str, &str, &str, [f64; 3])] = &[
    (
        "(01) LDPE",
        "LDPE",
        "CRT102.50",
        "Carat",
        "without stabilizers",
        [2850.0, 1465.0, 720.0],
    ),
    (
        "(03) PP",
        "PP",
        "CRT200.00",
        "Carat",
        "homo polymer",
        [2950.0, 1455.0, 1376.0],
    ),
    (
        "(05) PS",
        "PS",
        "CRT300.00",
        "Carat",
        "GPPS",
        [3026.0, 1601.0, 1001.0],
    ),
];

fn main() {
    env_logger::init();
    let mut rng = SimpleRng::new(42);

    let root = PathBuf::from(std::env::args().nth(1).unwrap_or_else(|| ".".to_string()));
    let spectra_dir = root.join("spectra");
    std::fs::create_dir_all(&spectra_dir).expect("Failed to create spectra directory");

    // ATR axis: 4000 → 600 cm-1, step 4.
    let atr_x: Vec<f64> = (0..851).map(|i| 4000.0 - i as f64 * 4.0).collect();
    // Raman axis in wavelength: 535 → 700 nm under 532 nm excitation.
    let raman_x: Vec<f64> = (0..600).map(|i| 535.0 + i as f64 * 0.275).collect();

    let mut records = Vec::new();

    for region in REGIONS {
        for treatment in ["bio", "nobio"] {
            for analysis in ["Raman", "ATR"] {
                for (polymer, code, product_id, supplier, specs, peaks_cm) in POLYMERS {
                    for exposure_days in [7i64, 30] {
                        let (x, y_unit, x_unit, y) = if analysis == "Raman" {
                            // Raman peaks live in shift space; place them in
                            // wavelength via the inverse of the conversion.
                            let peaks: Vec<(f64, f64, f64)> = peaks_cm
                                .iter()
                                .map(|&shift| {
                                    let nm = 1e7 / (1e7 / 532.0 - shift);
                                    (nm, 1.2, 800.0 + 400.0 * rng.next_f64())
                                })
                                .collect();
                            let y = generate_signal(&raman_x, &peaks, 8.0, &mut rng);
                            (&raman_x, "Intensity", "nm", y)
                        } else {
                            let peaks: Vec<(f64, f64, f64)> = peaks_cm
                                .iter()
                                .map(|&mu| (mu, 12.0, 0.3 + 0.4 * rng.next_f64()))
                                .collect();
                            let y = generate_signal(&atr_x, &peaks, 0.002, &mut rng);
                            (&atr_x, "A", "cm-1", y)
                        };

                        let hash = spectrum_hash(x, &y);
                        let file = format!("{}_{}_{}_{}.csv", region.code, code, treatment, &hash[..8]);

                        let mut csv = String::with_capacity(x.len() * 16);
                        csv.push_str(&format!("{x_unit},{y_unit}\n"));
                        for (xi, yi) in x.iter().zip(y.iter()) {
                            csv.push_str(&format!("{xi},{yi}\n"));
                        }
                        std::fs::write(spectra_dir.join(&file), csv)
                            .expect("Failed to write spectrum file");

                        records.push(json!({
                            "index": records.len(),
                            "Region": region.code,
                            "Campaign": "Summer",
                            "State": "dry",
                            "Treatment": treatment,
                            "Analysis": analysis,
                            "Exposure_days": exposure_days,
                            "Polymer": polymer,
                            "Polymer_ID": polymer[1..3].parse::<i64>().unwrap(),
                            "Supplier": supplier,
                            "Product_ID": product_id,
                            "Specifications": specs,
                            "file": file,
                            "file_legacy": format!("raw/{}_{}.txt", code, records.len()),
                            "LocationDescription": region.description,
                            "Country": region.country,
                            "LAT": region.lat,
                            "LON": region.lon,
                            "spec_hash": hash,
                            "x_unit": x_unit,
                            "y_unit": y_unit,
                            "Replicate": "A",
                        }));
                    }
                }
            }
        }
    }

    let fields: Vec<serde_json::Value> = std::iter::once(json!({"name": "index", "type": "integer"}))
        .chain(REQUIRED_COLUMNS.iter().map(|c| json!({"name": c})))
        .chain(std::iter::once(json!({"name": "Replicate"})))
        .collect();
    let catalog = json!({
        "schema": {
            "fields": fields,
            "primaryKey": ["index"],
            "pandas_version": "1.4.0",
        },
        "data": records,
    });

    let metadata_path = root.join("metadata.json");
    std::fs::write(
        &metadata_path,
        serde_json::to_string_pretty(&catalog).unwrap(),
    )
    .expect("Failed to write metadata.json");

    println!(
        "Wrote {} measurements to {} (spectra in {})",
        catalog["data"].as_array().unwrap().len(),
        metadata_path.display(),
        spectra_dir.display()
    );
}
