//! The shared save pipeline.
//!
//! Every save runs the same stages, each consuming the previous one:
//!
//! ```text
//! SaveRequest --validate--> ValidatedSave --encode--> EncodedSave --deliver--> Delivered
//! ```
//!
//! A failure at any stage returns a [`SaveError`] and drops the request.
//! Because each stage takes `self` by value, a request can't be run twice and
//! its payload can't reach more than one sink.

use std::io::Write;
use std::path::Path;

use tracing::{debug, debug_span, info};

use crate::encode::{EncodeError, ImageJpegEncoder, JpegEncode};
use crate::format::{normalize, NormalizedImage};
use crate::options::{Quality, SaveOptions};
use crate::profile::{resolve_profile, ResolvedProfile};
use crate::sink::{self, Delivered, EncodedPayload, JpegBuffer, Sink};
use crate::source::SourceImage;
use crate::SaveError;

/// A save that has not been validated yet.
#[derive(Debug)]
pub struct SaveRequest<'a> {
    image: &'a SourceImage,
    options: &'a SaveOptions,
    sink: Sink,
}

impl<'a> SaveRequest<'a> {
    pub fn new(image: &'a SourceImage, options: &'a SaveOptions, sink: Sink) -> Self {
        Self {
            image,
            options,
            sink,
        }
    }

    pub fn sink(&self) -> &Sink {
        &self.sink
    }

    /// Check options and image, and resolve the ICC profile and EXIF data.
    ///
    /// Checks run in order: quality, band layout, then profile, so a profile
    /// file is only read for a request that is otherwise saveable.
    pub fn validate(self) -> Result<ValidatedSave<'a>, SaveError> {
        let quality = self.options.validated_quality()?;
        let image = normalize(self.image)?;
        let profile = resolve_profile(&self.options.profile, self.image)?;

        debug!(
            quality = quality.get(),
            layout = ?image.layout,
            icc_len = profile.as_bytes().map_or(0, <[u8]>::len),
            exif_len = image.exif.map_or(0, <[u8]>::len),
            "Save request validated"
        );

        Ok(ValidatedSave {
            image,
            quality,
            profile,
            sink: self.sink,
        })
    }

    /// Run the whole pipeline with the default encoder.
    pub fn execute(self) -> Result<Delivered, SaveError> {
        self.execute_with(&ImageJpegEncoder)
    }

    /// Run the whole pipeline with `encoder`.
    pub fn execute_with<E: JpegEncode + ?Sized>(self, encoder: &E) -> Result<Delivered, SaveError> {
        self.run(encoder, EncodedSave::deliver)
    }

    fn run<E, T>(
        self,
        encoder: &E,
        finish: impl FnOnce(EncodedSave) -> Result<T, SaveError>,
    ) -> Result<T, SaveError>
    where
        E: JpegEncode + ?Sized,
    {
        let _span = debug_span!(
            "jpegsave",
            operation = self.sink.nickname(),
            width = self.image.width(),
            height = self.image.height(),
        )
        .entered();

        finish(self.validate()?.encode(encoder)?)
    }
}

/// A validated save, ready for the encoder.
#[derive(Debug)]
pub struct ValidatedSave<'a> {
    image: NormalizedImage<'a>,
    quality: Quality,
    profile: ResolvedProfile,
    sink: Sink,
}

impl<'a> ValidatedSave<'a> {
    pub fn image(&self) -> &NormalizedImage<'a> {
        &self.image
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn profile(&self) -> &ResolvedProfile {
        &self.profile
    }

    /// Call the encoder once.
    ///
    /// # Errors
    ///
    /// Returns `SaveError::Encode` if the encoder fails or produces no bytes.
    pub fn encode<E: JpegEncode + ?Sized>(self, encoder: &E) -> Result<EncodedSave, SaveError> {
        let bytes = encoder.encode(&self.image, self.quality, &self.profile)?;
        if bytes.is_empty() {
            return Err(EncodeError::EmptyOutput.into());
        }
        debug!(len = bytes.len(), "JPEG encoded");

        Ok(EncodedSave {
            payload: EncodedPayload::new(bytes),
            sink: self.sink,
        })
    }
}

/// An encoded save waiting for its sink.
#[derive(Debug)]
pub struct EncodedSave {
    payload: EncodedPayload,
    sink: Sink,
}

impl EncodedSave {
    pub fn payload(&self) -> &EncodedPayload {
        &self.payload
    }

    /// Hand the payload to the request's sink.
    pub fn deliver(self) -> Result<Delivered, SaveError> {
        sink::deliver(self.payload, self.sink)
    }

    /// Move the payload into a caller-owned buffer.
    fn into_buffer(self) -> JpegBuffer {
        let buffer = sink::into_buffer(self.payload);
        info!(operation = self.sink.nickname(), bytes = buffer.len(), "JPEG delivered");
        buffer
    }

    /// Write the payload as a MIME response to `out` instead of stdout.
    fn deliver_mime<W: Write + ?Sized>(self, out: &mut W) -> Result<usize, SaveError> {
        let bytes_written = sink::write_mime(out, self.payload)?;
        info!(operation = self.sink.nickname(), bytes = bytes_written, "JPEG delivered");
        Ok(bytes_written)
    }
}

/// Save `image` as a JPEG file at `path`.
pub fn save_to_file(
    image: &SourceImage,
    path: impl AsRef<Path>,
    options: &SaveOptions,
) -> Result<(), SaveError> {
    let sink = Sink::File(path.as_ref().to_path_buf());
    SaveRequest::new(image, options, sink).execute()?;
    Ok(())
}

/// Save `image` as JPEG into a buffer owned by the caller.
pub fn save_to_buffer(image: &SourceImage, options: &SaveOptions) -> Result<JpegBuffer, SaveError> {
    SaveRequest::new(image, options, Sink::Buffer)
        .run(&ImageJpegEncoder, |encoded| Ok(encoded.into_buffer()))
}

/// Save `image` as a MIME JPEG response on standard output.
pub fn save_to_stream(image: &SourceImage, options: &SaveOptions) -> Result<(), SaveError> {
    SaveRequest::new(image, options, Sink::Stream).execute()?;
    Ok(())
}

/// As [`save_to_stream`], but write the response to `out`.
pub fn save_to_writer<W: Write + ?Sized>(
    image: &SourceImage,
    options: &SaveOptions,
    out: &mut W,
) -> Result<(), SaveError> {
    SaveRequest::new(image, options, Sink::Stream)
        .run(&ImageJpegEncoder, |encoded| encoded.deliver_mime(out))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::BandLayout;
    use crate::options::ProfileDirective;
    use crate::source::Samples;
    use crate::ErrorKind;
    use std::cell::{Cell, RefCell};
    use std::path::PathBuf;

    /// Records what it was called with, then encodes for real.
    #[derive(Default)]
    struct RecordingEncoder {
        calls: Cell<usize>,
        seen: RefCell<Option<(u32, u32, BandLayout, Vec<u8>, u8, ResolvedProfile)>>,
    }

    impl JpegEncode for RecordingEncoder {
        fn encode(
            &self,
            image: &NormalizedImage<'_>,
            quality: Quality,
            profile: &ResolvedProfile,
        ) -> Result<Vec<u8>, EncodeError> {
            self.calls.set(self.calls.get() + 1);
            *self.seen.borrow_mut() = Some((
                image.width,
                image.height,
                image.layout,
                image.pixels.to_vec(),
                quality.get(),
                profile.clone(),
            ));
            ImageJpegEncoder.encode(image, quality, profile)
        }
    }

    fn failing_encoder(
        _image: &NormalizedImage<'_>,
        _quality: Quality,
        _profile: &ResolvedProfile,
    ) -> Result<Vec<u8>, EncodeError> {
        Err(EncodeError::EncodingFailed("out of memory".into()))
    }

    fn empty_encoder(
        _image: &NormalizedImage<'_>,
        _quality: Quality,
        _profile: &ResolvedProfile,
    ) -> Result<Vec<u8>, EncodeError> {
        Ok(Vec::new())
    }

    fn rgb_image() -> SourceImage {
        let pixels: Vec<u8> = (0..32 * 24 * 3).map(|i| (i * 13 % 256) as u8).collect();
        SourceImage::new(32, 24, 3, Samples::U8(pixels)).unwrap()
    }

    fn is_jpeg(bytes: &[u8]) -> bool {
        bytes.len() >= 4 && bytes[..2] == [0xFF, 0xD8] && bytes[bytes.len() - 2..] == [0xFF, 0xD9]
    }

    #[test]
    fn test_mono_u16_end_to_end() {
        // Single band, 16-bit, no metadata
        let samples: Vec<u16> = (0..40 * 30).map(|i| (i % 300) as u16).collect();
        let image = SourceImage::new(40, 30, 1, Samples::U16(samples.clone())).unwrap();
        let options = SaveOptions::builder().quality(90).build();
        let encoder = RecordingEncoder::default();

        let delivered = SaveRequest::new(&image, &options, Sink::Buffer)
            .execute_with(&encoder)
            .unwrap();

        assert_eq!(encoder.calls.get(), 1);
        let (width, height, layout, pixels, quality, profile) =
            encoder.seen.borrow_mut().take().unwrap();
        assert_eq!((width, height, layout), (40, 30, BandLayout::Mono));
        assert_eq!(quality, 90);
        assert!(profile.is_none());
        let expected: Vec<u8> = samples.iter().map(|&v| v.min(255) as u8).collect();
        assert_eq!(pixels, expected);

        let buffer = delivered.into_buffer().unwrap();
        assert!(is_jpeg(&buffer));
        let decoded = image::load_from_memory(&buffer).unwrap();
        assert_eq!(decoded.color(), image::ColorType::L8);
        assert_eq!((decoded.width(), decoded.height()), (40, 30));
    }

    #[test]
    fn test_quality_rejected_before_encoding() {
        let image = rgb_image();
        for quality in [0, 101, -1, 1000] {
            let options = SaveOptions::builder().quality(quality).build();
            let encoder = RecordingEncoder::default();

            let err = SaveRequest::new(&image, &options, Sink::Buffer)
                .execute_with(&encoder)
                .unwrap_err();
            assert!(matches!(err, SaveError::QualityOutOfRange(q) if q == quality));
            assert_eq!(encoder.calls.get(), 0);
        }
    }

    #[test]
    fn test_band_count_rejected_before_encoding() {
        for bands in [2u32, 5] {
            let image =
                SourceImage::new(4, 4, bands, Samples::U8(vec![0; 16 * bands as usize])).unwrap();
            let options = SaveOptions::default();
            let encoder = RecordingEncoder::default();

            let err = SaveRequest::new(&image, &options, Sink::Buffer)
                .execute_with(&encoder)
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Configuration);
            assert!(matches!(err, SaveError::UnsupportedBands(b) if b == bands));
            assert_eq!(encoder.calls.get(), 0);
        }
    }

    #[test]
    fn test_unreadable_profile_rejected_before_encoding() {
        let image = rgb_image();
        let options = SaveOptions::builder()
            .profile("/nonexistent/profile.icc")
            .build();
        let encoder = RecordingEncoder::default();

        let err = SaveRequest::new(&image, &options, Sink::Buffer)
            .execute_with(&encoder)
            .unwrap_err();
        assert!(matches!(err, SaveError::ProfileUnreadable { .. }));
        assert_eq!(encoder.calls.get(), 0);
    }

    #[test]
    fn test_quality_checked_before_profile() {
        let image = rgb_image();
        let options = SaveOptions::builder()
            .quality(0)
            .profile("/nonexistent/profile.icc")
            .build();

        let err = SaveRequest::new(&image, &options, Sink::Buffer)
            .validate()
            .unwrap_err();
        assert!(matches!(err, SaveError::QualityOutOfRange(0)));
    }

    #[test]
    fn test_embedded_profile_reaches_encoder() {
        let image = rgb_image().with_icc_profile(b"embedded".to_vec());
        let options = SaveOptions::default();

        let validated = SaveRequest::new(&image, &options, Sink::Buffer)
            .validate()
            .unwrap();
        assert_eq!(validated.profile().as_bytes(), Some(&b"embedded"[..]));
        assert_eq!(validated.quality(), Quality::DEFAULT);
        assert_eq!(validated.image().layout, BandLayout::Rgb);
    }

    #[test]
    fn test_no_profile_suppresses_embedded() {
        let image = rgb_image().with_icc_profile(b"embedded".to_vec());
        let options = SaveOptions::builder().no_profile().build();
        let encoder = RecordingEncoder::default();

        SaveRequest::new(&image, &options, Sink::Buffer)
            .execute_with(&encoder)
            .unwrap();
        let seen = encoder.seen.borrow_mut().take().unwrap();
        assert!(seen.5.is_none());
    }

    #[test]
    fn test_encoder_failure_reaches_no_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never.jpg");
        let image = rgb_image();
        let options = SaveOptions::default();

        let err = SaveRequest::new(&image, &options, Sink::File(path.clone()))
            .execute_with(&failing_encoder)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encode);
        assert!(!path.exists());
    }

    #[test]
    fn test_empty_encoder_output_is_an_encode_error() {
        let image = rgb_image();
        let options = SaveOptions::default();

        let err = SaveRequest::new(&image, &options, Sink::Buffer)
            .execute_with(&empty_encoder)
            .unwrap_err();
        assert!(matches!(err, SaveError::Encode(EncodeError::EmptyOutput)));
    }

    #[test]
    fn test_buffer_matches_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        let image = rgb_image();
        let options = SaveOptions::builder().quality(85).build();

        save_to_file(&image, &path, &options).unwrap();
        let buffer = save_to_buffer(&image, &options).unwrap();

        let on_disk = std::fs::read(&path).unwrap();
        assert_eq!(buffer.len(), on_disk.len());
        assert_eq!(buffer.as_bytes(), &on_disk[..]);
    }

    #[test]
    fn test_buffer_length_matches_encoder_output() {
        let image = rgb_image();
        let options = SaveOptions::default();

        let validated = SaveRequest::new(&image, &options, Sink::Buffer)
            .validate()
            .unwrap();
        let direct = ImageJpegEncoder
            .encode(validated.image(), validated.quality(), validated.profile())
            .unwrap();

        let buffer = save_to_buffer(&image, &options).unwrap();
        assert_eq!(buffer.len(), direct.len());
        assert_eq!(buffer.into_vec(), direct);
    }

    #[test]
    fn test_save_to_writer_mime() {
        let image = rgb_image();
        let options = SaveOptions::default();

        let mut out = Vec::new();
        save_to_writer(&image, &options, &mut out).unwrap();

        let body = save_to_buffer(&image, &options).unwrap();
        let header = format!(
            "Content-length: {}\r\nContent-type: image/jpeg\r\n\r\n",
            body.len()
        );
        assert!(out.starts_with(header.as_bytes()));
        assert_eq!(&out[header.len()..], body.as_bytes());
    }

    #[test]
    fn test_save_to_writer_rejects_bad_quality_without_output() {
        let image = rgb_image();
        let options = SaveOptions::builder().quality(0).build();

        let mut out = Vec::new();
        let err = save_to_writer(&image, &options, &mut out).unwrap_err();
        assert!(err.is_configuration());
        assert!(out.is_empty());
    }

    #[test]
    fn test_save_to_file_unwritable_path() {
        let image = rgb_image();
        let path = PathBuf::from("/nonexistent/dir/out.jpg");

        let err = save_to_file(&image, &path, &SaveOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_explicit_profile_is_embedded() {
        let dir = tempfile::tempdir().unwrap();
        let icc_path = dir.path().join("custom.icc");
        std::fs::write(&icc_path, b"custom-profile").unwrap();

        let image = rgb_image().with_icc_profile(b"embedded".to_vec());
        let options = SaveOptions {
            profile: ProfileDirective::Path(icc_path),
            ..Default::default()
        };

        let buffer = save_to_buffer(&image, &options).unwrap();
        let mut decoder =
            image::codecs::jpeg::JpegDecoder::new(std::io::Cursor::new(buffer.as_bytes())).unwrap();
        let icc = image::ImageDecoder::icc_profile(&mut decoder).unwrap();
        assert_eq!(icc.as_deref(), Some(&b"custom-profile"[..]));
    }

    fn decoded_exif(jpeg: &[u8]) -> Option<Vec<u8>> {
        let mut decoder =
            image::codecs::jpeg::JpegDecoder::new(std::io::Cursor::new(jpeg)).unwrap();
        image::ImageDecoder::exif_metadata(&mut decoder).unwrap()
    }

    // Big-endian TIFF header with an empty IFD
    const EXIF: &[u8] = b"MM\0*\0\0\0\x08\0\0\0\0\0\0";

    #[test]
    fn test_attached_exif_is_saved() {
        let image = rgb_image().with_exif(EXIF.to_vec());
        let options = SaveOptions::builder().no_profile().build();

        let validated = SaveRequest::new(&image, &options, Sink::Buffer)
            .validate()
            .unwrap();
        assert_eq!(validated.image().exif, Some(EXIF));

        let buffer = save_to_buffer(&image, &options).unwrap();
        assert_eq!(decoded_exif(&buffer).as_deref(), Some(EXIF));

        let cmyk = SourceImage::new(8, 8, 4, Samples::U8(vec![64; 8 * 8 * 4]))
            .unwrap()
            .with_exif(EXIF.to_vec());
        let buffer = save_to_buffer(&cmyk, &options).unwrap();
        assert_eq!(decoded_exif(&buffer).as_deref(), Some(EXIF));
    }

    #[test]
    fn test_oversized_exif_does_not_fail_save() {
        let image = rgb_image().with_exif(vec![0; crate::encode::MAX_EXIF_LEN + 1]);
        let buffer = save_to_buffer(&image, &SaveOptions::default()).unwrap();
        assert!(is_jpeg(&buffer));
        assert_eq!(decoded_exif(&buffer), None);
    }

    #[test]
    fn test_cmyk_end_to_end() {
        let image = SourceImage::new(8, 8, 4, Samples::I32(vec![64; 8 * 8 * 4])).unwrap();
        let buffer = save_to_buffer(&image, &SaveOptions::default()).unwrap();
        assert!(is_jpeg(&buffer));
    }

    #[test]
    fn test_concurrent_saves_share_image() {
        let image = rgb_image();
        let options = SaveOptions::default();
        let expected = save_to_buffer(&image, &options).unwrap();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| save_to_buffer(&image, &options).unwrap()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
