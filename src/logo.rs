use crate::error::OverlayError;
use crate::geometry::{FrontendRect, PageSize, PdfRect, to_pdf_space};

const LOGO_MAX_WIDTH: f32 = 60.0;
const LOGO_MAX_HEIGHT: f32 = 30.0;
const LOGO_MARGIN: f32 = 10.0;

/// Logo bitmap plus its intrinsic pixel dimensions. JPEG only: the bytes are
/// embedded into the output PDF as-is (DCTDecode), so no decoder is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoImage {
    pub data: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

impl LogoImage {
    /// Reads the frame dimensions from the JPEG start-of-frame marker.
    pub fn from_jpeg(data: Vec<u8>) -> Result<Self, OverlayError> {
        if data.len() < 4 || data[0] != 0xFF || data[1] != 0xD8 {
            return Err(OverlayError::UnsupportedLogo(
                "logo must be a JPEG image".to_string(),
            ));
        }

        let mut index = 2;
        while index + 9 <= data.len() {
            if data[index] != 0xFF {
                break;
            }
            let marker = data[index + 1];
            if marker == 0xFF {
                index += 1;
                continue;
            }
            // standalone markers carry no length field
            if (0xD0..=0xD9).contains(&marker) {
                index += 2;
                continue;
            }

            if is_start_of_frame(marker) {
                let height = u32::from(u16::from_be_bytes([data[index + 5], data[index + 6]]));
                let width = u32::from(u16::from_be_bytes([data[index + 7], data[index + 8]]));
                if width == 0 || height == 0 {
                    return Err(OverlayError::UnsupportedLogo(
                        "JPEG frame has zero dimensions".to_string(),
                    ));
                }
                return Ok(Self {
                    data,
                    width_px: width,
                    height_px: height,
                });
            }

            let length = usize::from(u16::from_be_bytes([data[index + 2], data[index + 3]]));
            index += 2 + length;
        }

        Err(OverlayError::UnsupportedLogo(
            "no JPEG start-of-frame marker found".to_string(),
        ))
    }

    /// Intrinsic size interpreted directly as PDF points, matching how the
    /// render collaborator treats embedded images.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn intrinsic(&self) -> (f32, f32) {
        (self.width_px as f32, self.height_px as f32)
    }
}

fn is_start_of_frame(marker: u8) -> bool {
    matches!(
        marker,
        0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF
    )
}

/// Computes where the logo lands on a page. An explicit frontend placement
/// goes through the coordinate mapper like any rectangle; otherwise the logo
/// is scaled to fit 60×30 and anchored to the top-right corner with a
/// 10-unit margin. The same placement applies to every page.
#[must_use]
pub fn place_logo(
    intrinsic: (f32, f32),
    placement: Option<FrontendRect>,
    page: PageSize,
) -> PdfRect {
    if let Some(frontend) = placement {
        return to_pdf_space(frontend, page);
    }

    let (intrinsic_width, intrinsic_height) = intrinsic;
    let width = LOGO_MAX_WIDTH.min(intrinsic_width);
    let scaled_height = intrinsic_height * width / intrinsic_width;
    let height = scaled_height.min(LOGO_MAX_HEIGHT);
    let width = intrinsic_width * height / intrinsic_height;

    PdfRect {
        x: page.width - width - LOGO_MARGIN,
        y: page.height - height - LOGO_MARGIN,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{LogoImage, place_logo};
    use crate::geometry::{FrontendRect, PageSize, to_pdf_space};

    const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
    };

    #[test]
    fn small_logo_keeps_intrinsic_size_in_the_corner() {
        let rect = place_logo((40.0, 20.0), None, LETTER);
        assert_eq!(rect.width, 40.0);
        assert_eq!(rect.height, 20.0);
        assert_eq!(rect.x, 612.0 - 40.0 - 10.0);
        assert_eq!(rect.y, 792.0 - 20.0 - 10.0);
    }

    #[test]
    fn wide_logo_is_capped_at_both_limits() {
        let rect = place_logo((120.0, 60.0), None, LETTER);
        assert_eq!(rect.width, 60.0);
        assert_eq!(rect.height, 30.0);
    }

    #[test]
    fn tall_logo_is_height_limited() {
        let rect = place_logo((60.0, 120.0), None, LETTER);
        assert_eq!(rect.height, 30.0);
        assert_eq!(rect.width, 15.0);
    }

    #[test]
    fn explicit_placement_goes_through_the_mapper() {
        let frontend = FrontendRect {
            x: 700.0,
            y: 20.0,
            width: 80.0,
            height: 40.0,
        };
        let rect = place_logo((999.0, 999.0), Some(frontend), LETTER);
        let expected = to_pdf_space(frontend, LETTER);
        assert_eq!(rect, expected);
    }

    #[test]
    fn reads_dimensions_from_sof_marker() {
        let mut bytes = vec![
            0xFF, 0xD8, // SOI
            0xFF, 0xC0, 0x00, 0x11, 0x08, 0x00, 0x20, 0x00, 0x40, 0x03,
        ];
        bytes.extend(std::iter::repeat_n(0u8, 16));

        let logo = LogoImage::from_jpeg(bytes).expect("minimal JPEG parses");
        assert_eq!(logo.height_px, 32);
        assert_eq!(logo.width_px, 64);
        assert_eq!(logo.intrinsic(), (64.0, 32.0));
    }

    #[test]
    fn skips_leading_segments_before_sof() {
        let mut bytes = vec![0xFF, 0xD8];
        // APP0 segment, 4 bytes of payload
        bytes.extend([0xFF, 0xE0, 0x00, 0x06, 0x4A, 0x46, 0x49, 0x46]);
        bytes.extend([0xFF, 0xC2, 0x00, 0x11, 0x08, 0x01, 0x00, 0x02, 0x00, 0x03]);
        bytes.extend(std::iter::repeat_n(0u8, 16));

        let logo = LogoImage::from_jpeg(bytes).expect("JPEG with APP0 parses");
        assert_eq!(logo.height_px, 256);
        assert_eq!(logo.width_px, 512);
    }

    #[test]
    fn rejects_non_jpeg_bytes() {
        let png_magic = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert!(LogoImage::from_jpeg(png_magic).is_err());
        assert!(LogoImage::from_jpeg(Vec::new()).is_err());
    }
}
