// tierthumb/src/processors/resizer.rs
use crate::core::{ProbedDimensions, ResizeAlgorithm};
use image::{imageops::FilterType, DynamicImage, GenericImageView};

pub struct Resizer {
    algorithm: ResizeAlgorithm,
}

impl Resizer {
    pub fn new(algorithm: ResizeAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Dimensions after dividing both sides by `factor`, never below 1x1.
    pub fn subsampled_dimensions(width: u32, height: u32, factor: u32) -> (u32, u32) {
        let factor = factor.max(1);
        ((width / factor).max(1), (height / factor).max(1))
    }

    /// Shrinks a decoded raster by an integer factor. Consumes the input so
    /// only the reduced buffer survives.
    pub fn subsample(&self, image: DynamicImage, factor: u32) -> DynamicImage {
        let (width, height) = image.dimensions();
        self.subsample_from(image, ProbedDimensions { width, height }, factor)
    }

    /// Like `subsample`, for a raster the decoder may already have shrunk.
    /// The target is always computed from the source's full dimensions.
    pub fn subsample_from(
        &self,
        image: DynamicImage,
        full: ProbedDimensions,
        factor: u32,
    ) -> DynamicImage {
        let (width, height) = Self::subsampled_dimensions(full.width, full.height, factor);
        let (current_width, current_height) = image.dimensions();

        if width == current_width && height == current_height {
            log::debug!("Sampling factor {} leaves image unchanged, skipping resize", factor);
            return image;
        }

        log::debug!(
            "Subsampling image from {}x{} to {}x{} (factor {} of {}x{})",
            current_width,
            current_height,
            width,
            height,
            factor,
            full.width,
            full.height
        );

        image.resize_exact(width, height, self.get_filter_type())
    }

    fn get_filter_type(&self) -> FilterType {
        match self.algorithm {
            ResizeAlgorithm::Nearest => FilterType::Nearest,
            ResizeAlgorithm::Bilinear => FilterType::Triangle,
            ResizeAlgorithm::Bicubic => FilterType::CatmullRom,
            ResizeAlgorithm::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn divides_and_floors() {
        assert_eq!(Resizer::subsampled_dimensions(3001, 100, 6), (500, 16));
        assert_eq!(Resizer::subsampled_dimensions(200, 200, 2), (100, 100));
        assert_eq!(Resizer::subsampled_dimensions(5, 3, 12), (1, 1));
        assert_eq!(Resizer::subsampled_dimensions(640, 480, 0), (640, 480));
    }

    #[test]
    fn factor_one_keeps_raster() {
        let resizer = Resizer::new(ResizeAlgorithm::Nearest);
        let image = DynamicImage::ImageRgb8(RgbImage::new(30, 20));
        assert_eq!(resizer.subsample(image, 1).dimensions(), (30, 20));
    }

    #[test]
    fn subsample_shrinks_every_filter() {
        for algorithm in [
            ResizeAlgorithm::Nearest,
            ResizeAlgorithm::Bilinear,
            ResizeAlgorithm::Bicubic,
            ResizeAlgorithm::Lanczos3,
        ] {
            let resizer = Resizer::new(algorithm);
            let image = DynamicImage::ImageRgb8(RgbImage::new(90, 45));
            assert_eq!(resizer.subsample(image, 3).dimensions(), (30, 15));
        }
    }

    #[test]
    fn target_comes_from_full_dimensions() {
        let resizer = Resizer::new(ResizeAlgorithm::Bilinear);
        let full = ProbedDimensions { width: 2400, height: 1600 };

        // Already reduced to 1/4 by the decoder, factor 5 still lands on 480x320.
        let reduced = DynamicImage::ImageRgb8(RgbImage::new(600, 400));
        assert_eq!(resizer.subsample_from(reduced, full, 5).dimensions(), (480, 320));

        let exact = DynamicImage::ImageRgb8(RgbImage::new(300, 200));
        assert_eq!(resizer.subsample_from(exact, full, 8).dimensions(), (300, 200));
    }
}
