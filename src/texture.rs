use crate::math::Color;
use crate::ppm;

/// A rectangular linear-RGB sample array with `(u, v) in [0,1]^2` lookup.
/// Coordinates wrap by fractional part; both a truncating nearest-neighbor
/// filter and a bilinear filter are supported.
#[derive(Debug)]
pub struct Texture {
    width: u32,
    height: u32,
    data: Vec<Color>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFilter {
    Nearest,
    Bilinear,
}

impl Texture {
    pub fn from_rgb8(width: u32, height: u32, bytes: &[u8]) -> Self {
        let data = bytes
            .chunks_exact(3)
            .map(|c| Color::new(c[0] as f64 / 255.0, c[1] as f64 / 255.0, c[2] as f64 / 255.0))
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    pub fn solid(width: u32, height: u32, color: Color) -> Self {
        Self {
            width,
            height,
            data: vec![color; (width * height) as usize],
        }
    }

    /// Loads a binary P6 PPM from disk, grounded in the original's
    /// `Texture::loadTexture` header parse.
    pub fn load_ppm(path: &std::path::Path) -> Result<Self, ppm::PpmError> {
        let (width, height, bytes) = ppm::read_ppm(path)?;
        Ok(Self::from_rgb8(width, height, &bytes))
    }

    fn texel(&self, x: u32, y: u32) -> Color {
        self.data[(y * self.width + x) as usize]
    }

    pub fn sample(&self, u: f64, v: f64, filter: TextureFilter) -> Color {
        let u = u.rem_euclid(1.0);
        let v = v.rem_euclid(1.0);
        match filter {
            TextureFilter::Nearest => {
                let x = ((u * self.width as f64) as u32).min(self.width - 1);
                let y = ((v * self.height as f64) as u32).min(self.height - 1);
                self.texel(x, y)
            }
            TextureFilter::Bilinear => {
                let fx = u * self.width as f64 - 0.5;
                let fy = v * self.height as f64 - 0.5;
                let x0 = fx.floor();
                let y0 = fy.floor();
                let tx = fx - x0;
                let ty = fy - y0;

                let wrap = |v: f64, n: u32| -> u32 {
                    let m = n as i64;
                    (((v as i64) % m + m) % m) as u32
                };
                let x0 = wrap(x0, self.width);
                let x1 = wrap(x0 as f64 + 1.0, self.width);
                let y0 = wrap(y0, self.height);
                let y1 = wrap(y0 as f64 + 1.0, self.height);

                let c00 = self.texel(x0, y0);
                let c10 = self.texel(x1, y0);
                let c01 = self.texel(x0, y1);
                let c11 = self.texel(x1, y1);

                c00.lerp(c10, tx).lerp(c01.lerp(c11, tx), ty)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_by_fractional_part() {
        let tex = Texture::solid(4, 4, Color::new(0.5, 0.5, 0.5));
        let a = tex.sample(0.1, 0.1, TextureFilter::Nearest);
        let b = tex.sample(1.1, 1.1, TextureFilter::Nearest);
        assert_eq!(a, b);
    }

    #[test]
    fn bilinear_interpolates_between_texels() {
        let mut tex = Texture::solid(2, 1, Color::zero());
        tex.data[0] = Color::new(0.0, 0.0, 0.0);
        tex.data[1] = Color::new(1.0, 1.0, 1.0);
        let mid = tex.sample(0.5, 0.5, TextureFilter::Bilinear);
        assert!(mid.x > 0.0 && mid.x < 1.0);
    }
}
