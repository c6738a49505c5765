// THEORY:
// The `Pixel` module is the most fundamental unit of the vibe engine. It is a
// "dumb" data container for a single RGBA pixel plus the handful of
// single-pixel heuristics the rest of the engine builds on. Anything that
// needs another pixel (edge gradients) or the whole raster (dominant colors,
// column averages) belongs in the higher-level modules.
//
// Key architectural principles:
// 1.  **Single-pixel scope**: Heuristics here never read neighbors or
//     history. `brightness()` is the engine's one true brightness metric
//     (the plain mean of R, G and B, alpha ignored), and both the feature
//     extractor and the narrative statistics share it, so a pixel can never
//     be "bright" for music and "dark" for prose.
// 2.  **Quantization lives with the channels**: `quantize()` folds a channel
//     into its 32-wide bucket base. The dominant-color counter works purely
//     on these bucket bases.

pub mod pixel {
    pub type Byte = u8;
    pub type Bytes = Vec<Byte>;
    pub type Channel = Byte;
    pub type Brightness = f64;

    const CHANNELS: usize = 4;

    /// Width of the channel buckets used for dominant-color counting.
    pub const QUANTIZE_BUCKET_WIDTH: Channel = 32;

    /// A "dumb" data container representing a single RGBA pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The alpha (transparency) channel value (0-255).
        pub alpha: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Pixel {
                red,
                green,
                blue,
                alpha,
            }
        }

        /// Brightness as the arithmetic mean of R, G and B. Alpha is ignored.
        /// Always in [0, 255].
        pub fn brightness(&self) -> Brightness {
            (self.red as Brightness + self.green as Brightness + self.blue as Brightness) / 3.0
        }

        /// The pixel's channels folded into their 32-wide bucket bases,
        /// e.g. (200, 13, 255) -> (192, 0, 224).
        pub fn quantized(&self) -> (Channel, Channel, Channel) {
            (
                Self::quantize(self.red),
                Self::quantize(self.green),
                Self::quantize(self.blue),
            )
        }

        /// Fold one channel into its bucket base value.
        pub fn quantize(channel: Channel) -> Channel {
            (channel / QUANTIZE_BUCKET_WIDTH) * QUANTIZE_BUCKET_WIDTH
        }
    }

    impl From<&[Byte]> for Pixel {
        fn from(bytes: &[Byte]) -> Self {
            if bytes.len() != CHANNELS {
                panic!("Cannot convert {} bytes into pixel.", bytes.len());
            }
            Pixel::new(bytes[0], bytes[1], bytes[2], bytes[3])
        }
    }

    impl From<Pixel> for Bytes {
        fn from(pixel: Pixel) -> Self {
            vec![pixel.red, pixel.green, pixel.blue, pixel.alpha]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::pixel::*;

    #[test]
    fn brightness_is_mean_of_rgb() {
        let pixel = Pixel::new(30, 60, 90, 255);
        assert_eq!(pixel.brightness(), 60.0);
    }

    #[test]
    fn brightness_ignores_alpha() {
        let opaque = Pixel::new(10, 20, 30, 255);
        let transparent = Pixel::new(10, 20, 30, 0);
        assert_eq!(opaque.brightness(), transparent.brightness());
    }

    #[test]
    fn brightness_bounds() {
        assert_eq!(Pixel::new(0, 0, 0, 255).brightness(), 0.0);
        assert_eq!(Pixel::new(255, 255, 255, 255).brightness(), 255.0);
    }

    #[test]
    fn quantize_folds_into_bucket_base() {
        assert_eq!(Pixel::quantize(0), 0);
        assert_eq!(Pixel::quantize(31), 0);
        assert_eq!(Pixel::quantize(32), 32);
        assert_eq!(Pixel::quantize(255), 224);
    }

    #[test]
    fn from_bytes_round_trip() {
        let bytes: &[u8] = &[1, 2, 3, 4];
        let pixel = Pixel::from(bytes);
        assert_eq!(pixel, Pixel::new(1, 2, 3, 4));
        let back: Bytes = pixel.into();
        assert_eq!(back, bytes);
    }
}
