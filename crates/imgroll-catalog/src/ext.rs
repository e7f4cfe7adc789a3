//! The fixed set of image extensions the catalog recognises.

use std::fmt;

/// A supported image file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageExt {
    Jpg,
    Jpeg,
    Png,
    Gif,
    Webp,
    Bmp,
    Tif,
    Tiff,
}

impl ImageExt {
    /// Every supported extension.
    pub const ALL: [ImageExt; 8] = [
        Self::Jpg,
        Self::Jpeg,
        Self::Png,
        Self::Gif,
        Self::Webp,
        Self::Bmp,
        Self::Tif,
        Self::Tiff,
    ];

    /// The canonical lowercase form, including the leading dot.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpg => ".jpg",
            Self::Jpeg => ".jpeg",
            Self::Png => ".png",
            Self::Gif => ".gif",
            Self::Webp => ".webp",
            Self::Bmp => ".bmp",
            Self::Tif => ".tif",
            Self::Tiff => ".tiff",
        }
    }

    /// Look up an extension such as `".JPG"`, ignoring ASCII case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|known| known.as_str().eq_ignore_ascii_case(ext))
    }
}

impl fmt::Display for ImageExt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns `true` if `ext` (with its leading dot) names a supported image type.
pub fn is_supported(ext: &str) -> bool {
    ImageExt::from_extension(ext).is_some()
}

/// The suffix of `file_name` starting at its last `.`, if any.
///
/// Only the final path element is considered, so `"a.d/b"` has no
/// extension while `".png"` is its own extension.
pub fn extension_of(file_name: &str) -> Option<&str> {
    let name = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    name.rfind('.').map(|idx| &name[idx..])
}
