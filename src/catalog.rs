//! Star catalog parsing.
//!
//! Two CSV inputs drive the background sky: a photometry table (magnitude,
//! BP-RP color index and cartesian position per star) and a constellation
//! line list keyed by HIP identifier. The photometry colors are converted to
//! RGB through a polynomial fit on the BP-RP index. Constellation stars are
//! appended to the catalog and their HIP ids remapped to catalog indices so
//! the rest of the system only ever deals in indices.

use std::collections::HashMap;

use nalgebra::Vector3;

use crate::texture::asset_path;

const SAMPLE_STARS: &str = include_str!("../assets/starData/bright_stars.csv");
const SAMPLE_SIGN_STARS: &str = include_str!("../assets/starData/sign_stars.csv");
const SAMPLE_SIGN_CONNS: &str = include_str!("../assets/starData/sign_conns.csv");

/// Color and size given to constellation stars appended to the catalog.
const SIGN_STAR_COLOR: [f32; 3] = [0.4, 0.1, 0.9];
const SIGN_STAR_SIZE: f32 = 5.0;

/// Positions, colors and sizes of every background star, in catalog order.
/// The active sun is part of the catalog as well (appended last on load).
pub struct StarCatalog {
    pub positions: Vec<Vector3<f32>>,
    pub colors: Vec<[f32; 3]>,
    pub sizes: Vec<f32>,
}

impl StarCatalog {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Parses the photometry CSV. Rows without a full position (or with `N/A`
/// placeholders) are skipped. Colors come from the BP-RP polynomial fit.
pub fn parse_star_catalog(data: &str) -> StarCatalog {
    let mut catalog = StarCatalog {
        positions: Vec::new(),
        colors: Vec::new(),
        sizes: Vec::new(),
    };
    for line in data.lines().skip(1) {
        let parts: Vec<&str> = line.trim().split(',').collect();
        if parts.len() != 10 {
            continue;
        }
        if parts[7] == "N/A" || parts[8] == "N/A" || parts[9] == "N/A" {
            continue;
        }
        let (mag, bp_rp) = match (parts[6].parse::<f32>(), parts[4].parse::<f32>()) {
            (Ok(mag), Ok(bp_rp)) => (mag, bp_rp),
            _ => continue,
        };
        let pos = match (
            parts[7].parse::<f32>(),
            parts[8].parse::<f32>(),
            parts[9].parse::<f32>(),
        ) {
            (Ok(x), Ok(y), Ok(z)) => Vector3::new(x, y, z),
            _ => continue,
        };
        let [r, g, b] = bp_rp_to_rgb(mag, bp_rp);
        catalog.positions.push(pos);
        catalog.colors.push([r / 5.0, g / 5.0, b / 5.0]);
        catalog.sizes.push(100.0);
    }
    catalog
}

/// Polynomial fit from Gaia magnitude and BP-RP color index to RGB.
fn bp_rp_to_rgb(mag: f32, bp_rp: f32) -> [f32; 3] {
    let poly = |c: [f32; 6]| -> f32 {
        mag + c[0]
            + c[1] * bp_rp
            + c[2] * bp_rp.powi(2)
            + c[3] * bp_rp.powi(3)
            + c[4] * bp_rp.powi(4)
            + c[5] * bp_rp.powi(5)
    };
    [
        poly([
            0.10979647,
            -0.14579334,
            0.10747392,
            -0.10635920,
            0.08494556,
            -0.01368962,
        ]),
        poly([
            -0.02330159,
            0.12884074,
            0.22149167,
            -0.14550480,
            0.10635149,
            -0.02363990,
        ]),
        poly([
            -0.13748689,
            0.44265552,
            0.37878846,
            -0.14923841,
            0.09172474,
            -0.02594726,
        ]),
    ]
}

/// Parsed constellation data, still keyed by HIP identifier.
pub struct SignData {
    /// (HIP, position) for every star referenced by some constellation.
    pub stars: Vec<(u32, Vector3<f32>)>,
    /// Constellation name to flat list of HIP pairs to connect.
    pub signs: HashMap<String, Vec<u32>>,
}

/// Parses the constellation line list plus the positions of the referenced
/// stars. Lines with empty HIP fields are skipped; stars not referenced by
/// any constellation are dropped.
pub fn parse_constellations(stars_data: &str, conns_data: &str) -> SignData {
    let mut signs: HashMap<String, Vec<u32>> = HashMap::new();
    let mut star_signs: HashMap<u32, Vec<String>> = HashMap::new();

    for line in conns_data.lines().skip(1) {
        let parts: Vec<&str> = line.trim().split(',').collect();
        if parts.len() < 4 || parts[1].is_empty() || parts[2].is_empty() {
            continue;
        }
        let (a, b) = match (parts[1].parse::<u32>(), parts[2].parse::<u32>()) {
            (Ok(a), Ok(b)) => (a, b),
            _ => continue,
        };
        let name = parts[3].to_string();
        signs.entry(name.clone()).or_default().extend([a, b]);
        star_signs.entry(a).or_default().push(name.clone());
        star_signs.entry(b).or_default().push(name);
    }

    let mut stars = Vec::new();
    for line in stars_data.lines().skip(1) {
        let parts: Vec<&str> = line.trim().split(',').collect();
        if parts.len() < 30 {
            continue;
        }
        let hip = match parts[0].parse::<u32>() {
            Ok(hip) => hip,
            Err(_) => continue,
        };
        if !star_signs.contains_key(&hip) {
            continue;
        }
        let pos = match (
            parts[27].parse::<f32>(),
            parts[28].parse::<f32>(),
            parts[29].parse::<f32>(),
        ) {
            (Ok(x), Ok(y), Ok(z)) => Vector3::new(x, y, z),
            _ => continue,
        };
        stars.push((hip, pos));
    }

    SignData { stars, signs }
}

/// Merges constellation stars into the photometry catalog and remaps every
/// HIP in the sign lists to the new catalog index. Appends the home sun as
/// the final catalog entry.
pub fn merge_catalog(
    mut catalog: StarCatalog,
    sign_data: SignData,
) -> (StarCatalog, HashMap<String, Vec<usize>>) {
    let mut hip_to_index: HashMap<u32, usize> = HashMap::new();
    for (hip, pos) in sign_data.stars {
        let index = catalog.len();
        catalog.positions.push(pos);
        catalog.colors.push(SIGN_STAR_COLOR);
        catalog.sizes.push(SIGN_STAR_SIZE);
        hip_to_index.insert(hip, index);
    }

    let mut signs = HashMap::new();
    for (name, hips) in sign_data.signs {
        let indices: Vec<usize> = hips
            .iter()
            .filter_map(|hip| hip_to_index.get(hip).copied())
            .collect();
        // Pairs survive only when both endpoints resolved to catalog stars.
        if indices.len() == hips.len() {
            signs.insert(name, indices);
        } else {
            log::warn!("constellation {} references unknown stars, dropped", name);
        }
    }

    // The home sun is part of the catalog so connections can reference it.
    catalog.positions.push(Vector3::zeros());
    catalog.colors.push([0.0, 1.0, 0.0]);
    catalog.sizes.push(5.0);

    (catalog, signs)
}

/// Loads the catalog from `assets/starData/`, falling back to the embedded
/// sample data when the files are absent.
pub fn load_catalog() -> (StarCatalog, HashMap<String, Vec<usize>>) {
    let read = |name: &str, fallback: &'static str| -> String {
        std::fs::read_to_string(asset_path(name)).unwrap_or_else(|_| fallback.to_string())
    };
    let stars = read("starData/bright_stars.csv", SAMPLE_STARS);
    let sign_stars = read("starData/sign_stars.csv", SAMPLE_SIGN_STARS);
    let sign_conns = read("starData/sign_conns.csv", SAMPLE_SIGN_CONNS);

    let catalog = parse_star_catalog(&stars);
    let sign_data = parse_constellations(&sign_stars, &sign_conns);
    merge_catalog(catalog, sign_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn photometry_rows_with_missing_positions_are_skipped() {
        let data = "header\n\
            a,b,c,d,0.5,e,2.0,100.0,200.0,300.0\n\
            a,b,c,d,0.5,e,2.0,N/A,N/A,N/A\n\
            short,row\n";
        let catalog = parse_star_catalog(data);
        assert_eq!(catalog.len(), 1);
        assert_relative_eq!(catalog.positions[0].x, 100.0);
        assert_eq!(catalog.sizes[0], 100.0);
    }

    #[test]
    fn sign_parsing_keeps_only_referenced_stars() {
        let conns = "header\n0,11,22,Ori\n0,22,33,Ori\n";
        let star_row = |hip: u32, x: f32| {
            let mut cols = vec![hip.to_string()];
            cols.extend(std::iter::repeat("0".to_string()).take(26));
            cols.extend([x.to_string(), "1.0".to_string(), "2.0".to_string()]);
            cols.join(",")
        };
        let stars = format!(
            "header\n{}\n{}\n{}\n{}\n",
            star_row(11, 5.0),
            star_row(22, 6.0),
            star_row(33, 7.0),
            star_row(99, 8.0)
        );
        let data = parse_constellations(&stars, conns);
        assert_eq!(data.stars.len(), 3);
        assert_eq!(data.signs["Ori"], vec![11, 22, 22, 33]);
    }

    #[test]
    fn merge_remaps_hips_to_catalog_indices() {
        let base = StarCatalog {
            positions: vec![Vector3::new(1.0, 0.0, 0.0)],
            colors: vec![[0.5, 0.5, 0.5]],
            sizes: vec![100.0],
        };
        let sign_data = SignData {
            stars: vec![(11, Vector3::new(2.0, 0.0, 0.0)), (22, Vector3::new(3.0, 0.0, 0.0))],
            signs: HashMap::from([("Ori".to_string(), vec![11, 22])]),
        };
        let (catalog, signs) = merge_catalog(base, sign_data);
        // base star + two sign stars + the appended sun
        assert_eq!(catalog.len(), 4);
        assert_eq!(signs["Ori"], vec![1, 2]);
        assert_eq!(catalog.positions[3], Vector3::zeros());
    }

    #[test]
    fn embedded_sample_data_loads() {
        let catalog = parse_star_catalog(SAMPLE_STARS);
        assert!(!catalog.is_empty());
        let sign_data = parse_constellations(SAMPLE_SIGN_STARS, SAMPLE_SIGN_CONNS);
        assert!(!sign_data.signs.is_empty());
        let (merged, signs) = merge_catalog(catalog, sign_data);
        assert!(merged.len() > 1);
        for indices in signs.values() {
            assert_eq!(indices.len() % 2, 0);
            assert!(indices.iter().all(|i| *i < merged.len()));
        }
    }
}
