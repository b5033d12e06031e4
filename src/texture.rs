//! Surface texture loading and decoding.
//!
//! Planet skins are looked up under `assets/textures/`; a missing or broken
//! file falls back to a flat placeholder color so the scene still builds.

/// The set of surface textures planets can be skinned with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Skin {
    LavaRock1,
    LavaRock2,
    Ice1,
    Ice2,
    IceAndWater1,
    IceAndWater2,
    /// Gas giant skins, numbered 1 through 15.
    GasGiant(u8),
}

impl Skin {
    pub fn filename(&self) -> String {
        match self {
            Skin::LavaRock1 => "textures/lavaRock1.png".to_string(),
            Skin::LavaRock2 => "textures/lavaRock2.png".to_string(),
            Skin::Ice1 => "textures/ice1.png".to_string(),
            Skin::Ice2 => "textures/ice2.png".to_string(),
            Skin::IceAndWater1 => "textures/iceAndWater1.png".to_string(),
            Skin::IceAndWater2 => "textures/iceAndWater2.png".to_string(),
            Skin::GasGiant(n) => format!("textures/gasGiant{:02}.png", n),
        }
    }

    /// Placeholder color used when the texture file is unavailable.
    pub fn fallback_color(&self) -> [u8; 3] {
        match self {
            Skin::LavaRock1 => [140, 55, 25],
            Skin::LavaRock2 => [110, 45, 30],
            Skin::Ice1 => [200, 220, 235],
            Skin::Ice2 => [180, 205, 225],
            Skin::IceAndWater1 => [120, 160, 200],
            Skin::IceAndWater2 => [100, 145, 190],
            Skin::GasGiant(n) => {
                let t = *n as u32;
                [
                    (150 + 7 * t).min(255) as u8,
                    (110 + 5 * t).min(255) as u8,
                    (70 + 3 * t).min(255) as u8,
                ]
            }
        }
    }

    pub fn all() -> Vec<Skin> {
        let mut skins = vec![
            Skin::LavaRock1,
            Skin::LavaRock2,
            Skin::Ice1,
            Skin::Ice2,
            Skin::IceAndWater1,
            Skin::IceAndWater2,
        ];
        for n in 1..=15 {
            skins.push(Skin::GasGiant(n));
        }
        skins
    }
}

/// A decoded RGB texture on the CPU side, ready for GL upload.
#[derive(Clone)]
pub struct SurfaceTexture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[u8; 3]>,
}

impl SurfaceTexture {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        use std::io::Cursor;
        let cursor = Cursor::new(bytes);
        let mut reader = image::ImageReader::new(cursor)
            .with_guessed_format()
            .map_err(|e| format!("Failed to guess format: {}", e))?;
        reader.no_limits();
        let img = reader
            .decode()
            .map_err(|e| format!("Failed to decode image: {}", e))?
            .to_rgb8();
        let width = img.width();
        let height = img.height();
        let pixels: Vec<[u8; 3]> = img.pixels().map(|p| p.0).collect();
        Ok(Self { width, height, pixels })
    }

    pub fn solid(color: [u8; 3]) -> Self {
        Self {
            width: 2,
            height: 2,
            pixels: vec![color; 4],
        }
    }
}

pub(crate) fn asset_path(relative: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("assets")
        .join(relative)
}

/// Loads a skin from disk, falling back to its placeholder color.
pub fn load_skin(skin: Skin) -> SurfaceTexture {
    match std::fs::read(asset_path(&skin.filename())) {
        Ok(bytes) => match SurfaceTexture::from_bytes(&bytes) {
            Ok(tex) => tex,
            Err(err) => {
                log::warn!("decoding {} failed: {}", skin.filename(), err);
                SurfaceTexture::solid(skin.fallback_color())
            }
        },
        Err(_) => SurfaceTexture::solid(skin.fallback_color()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_texture_has_uniform_pixels() {
        let tex = SurfaceTexture::solid([10, 20, 30]);
        assert_eq!(tex.pixels.len(), (tex.width * tex.height) as usize);
        assert!(tex.pixels.iter().all(|p| *p == [10, 20, 30]));
    }

    #[test]
    fn from_bytes_rejects_garbage() {
        assert!(SurfaceTexture::from_bytes(&[0, 1, 2, 3]).is_err());
    }

    #[test]
    fn every_skin_has_a_filename() {
        for skin in Skin::all() {
            assert!(skin.filename().starts_with("textures/"));
        }
        assert_eq!(Skin::all().len(), 21);
    }
}
