use crate::error::FormatError;
use crate::format::ContainerFormat;
use crate::{gif_comment, jpeg_exif, png_text, MetadataMap};

/// Embedding strategy for one container format. Operates on whole-file
/// byte buffers so callers control where bytes come from and go to.
pub(crate) trait EmbeddingChannel: Send + Sync {
    fn read(&self, data: &[u8]) -> Result<MetadataMap, FormatError>;

    fn write(&self, data: &[u8], map: &MetadataMap) -> Result<Vec<u8>, FormatError>;
}

struct ExifChannel;
struct PngTextChannel;
struct GifCommentChannel;

impl EmbeddingChannel for ExifChannel {
    fn read(&self, data: &[u8]) -> Result<MetadataMap, FormatError> {
        jpeg_exif::read(data)
    }

    fn write(&self, data: &[u8], map: &MetadataMap) -> Result<Vec<u8>, FormatError> {
        jpeg_exif::write(data, map)
    }
}

impl EmbeddingChannel for PngTextChannel {
    fn read(&self, data: &[u8]) -> Result<MetadataMap, FormatError> {
        png_text::read(data)
    }

    fn write(&self, data: &[u8], map: &MetadataMap) -> Result<Vec<u8>, FormatError> {
        png_text::write(data, map)
    }
}

impl EmbeddingChannel for GifCommentChannel {
    fn read(&self, data: &[u8]) -> Result<MetadataMap, FormatError> {
        gif_comment::read(data)
    }

    fn write(&self, data: &[u8], map: &MetadataMap) -> Result<Vec<u8>, FormatError> {
        gif_comment::write(data, map)
    }
}

pub(crate) fn channel_for(format: &ContainerFormat) -> Option<&'static dyn EmbeddingChannel> {
    match format {
        ContainerFormat::Jpeg => Some(&ExifChannel),
        ContainerFormat::Png => Some(&PngTextChannel),
        ContainerFormat::Gif => Some(&GifCommentChannel),
        ContainerFormat::Unsupported(_) => None,
    }
}
