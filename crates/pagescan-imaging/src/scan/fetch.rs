// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image-fetch collaborator: the seam through which the loader obtains a
// decoded raster for a locator, plus the default implementation that reads
// local files or downloads over HTTP and decodes with the `image` crate.

use std::future::Future;
use std::io::Cursor;
use std::time::Duration;

use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use pagescan_core::error::{Result, ScanError};
use pagescan_core::{FetchConfig, Locator};
use reqwest::header::{CACHE_CONTROL, HeaderMap, HeaderValue, PRAGMA};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::raster::Raster;
use crate::transform::rotate::rotate;

/// Which caches a fetch may read from or populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub memory: bool,
    pub disk: bool,
}

impl CachePolicy {
    /// Neither memory nor persistent caching.
    pub const fn disabled() -> Self {
        Self {
            memory: false,
            disk: false,
        }
    }

    pub const fn is_disabled(&self) -> bool {
        !self.memory && !self.disk
    }
}

/// How orientation is decided at decode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationOption {
    /// Honour the EXIF orientation tag, if the file carries one.
    AutoExif,
    /// Ignore EXIF and rotate clockwise by this many degrees.
    Force(i32),
}

impl RotationOption {
    /// `0` keeps EXIF handling; anything else forces that rotation.
    pub fn from_degrees(degrees: i32) -> Self {
        if degrees == 0 {
            Self::AutoExif
        } else {
            Self::Force(degrees)
        }
    }
}

/// Decoder hints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Container format; `None` sniffs it from the leading bytes.
    pub format: Option<ImageFormat>,
}

/// One request issued to an [`ImageFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub locator: Locator,
    pub rotation: RotationOption,
    pub cache: CachePolicy,
    pub decode: DecodeOptions,
}

/// Handle on an in-flight fetch/decode, owning whatever native resources
/// back it until [`DataSource::close`] is called.
pub trait DataSource: Send {
    /// Produce the final decoded raster. The result can be taken once.
    fn take_result(&mut self) -> Result<Raster>;

    /// Release the handle's resources. Calling it again is a no-op.
    fn close(&mut self);

    fn is_closed(&self) -> bool;
}

/// Fetches and decodes images on behalf of the loader.
pub trait ImageFetcher: Send + Sync {
    type Source: DataSource + 'static;

    /// Start fetching `request`. The returned source is owned by the caller,
    /// which must close it.
    fn fetch(&self, request: FetchRequest) -> impl Future<Output = Result<Self::Source>> + Send;
}

// -- Default collaborator -----------------------------------------------------

/// Reads local files with `tokio::fs`, downloads `http(s)` locators with
/// `reqwest`, and decodes with the `image` crate.
#[derive(Debug, Clone)]
pub struct PipelineFetcher {
    client: reqwest::Client,
}

impl PipelineFetcher {
    /// Build a fetcher. Only `timeout_secs` and `user_agent` are read.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|err| {
            ScanError::InvalidArgument(format!("HTTP client configuration rejected: {err}"))
        })?;
        Ok(Self { client })
    }

    async fn read_file(&self, path: &std::path::Path) -> Result<Vec<u8>> {
        tokio::fs::read(path).await.map_err(|err| {
            ScanError::DecodeFailure(format!("failed to read {}: {err}", path.display()))
        })
    }

    async fn download(&self, url: &str, cache: CachePolicy) -> Result<Vec<u8>> {
        let mut request = self.client.get(url);
        if cache.is_disabled() {
            request = request.headers(no_cache_headers());
        }

        let response = request.send().await.map_err(|err| {
            ScanError::DecodeFailure(format!("failed to download {url}: {err}"))
        })?;
        if !response.status().is_success() {
            return Err(ScanError::DecodeFailure(format!(
                "failed to download {url}: HTTP {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await.map_err(|err| {
            ScanError::DecodeFailure(format!("failed to read body of {url}: {err}"))
        })?;
        Ok(bytes.to_vec())
    }
}

impl ImageFetcher for PipelineFetcher {
    type Source = FetchedSource;

    fn fetch(&self, request: FetchRequest) -> impl Future<Output = Result<FetchedSource>> + Send {
        let span = info_span!("fetch", locator = %request.locator);
        async move {
            let fetched = match &request.locator {
                Locator::File(path) => self.read_file(path).await,
                Locator::Remote(url) => self.download(url, request.cache).await,
            };
            let bytes = fetched.inspect_err(|err| warn!("fetch failed: {err}"))?;

            info!(bytes = bytes.len(), "Encoded image fetched");
            Ok(FetchedSource {
                bytes: Some(bytes),
                rotation: request.rotation,
                decode: request.decode,
                closed: false,
            })
        }
        .instrument(span)
    }
}

fn no_cache_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers
}

/// Encoded bytes held by [`PipelineFetcher`] until decoded or closed.
#[derive(Debug)]
pub struct FetchedSource {
    bytes: Option<Vec<u8>>,
    rotation: RotationOption,
    decode: DecodeOptions,
    closed: bool,
}

impl DataSource for FetchedSource {
    fn take_result(&mut self) -> Result<Raster> {
        if self.closed {
            return Err(ScanError::DecodeFailure("data source already closed".into()));
        }
        let bytes = self
            .bytes
            .take()
            .ok_or_else(|| ScanError::DecodeFailure("decoded result already taken".into()))?;
        decode_oriented(&bytes, self.rotation, self.decode)
    }

    fn close(&mut self) {
        if !self.closed {
            self.bytes = None;
            self.closed = true;
            debug!("Fetched source closed");
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Decode `bytes`, then apply either the EXIF orientation or a forced
/// rotation.
fn decode_oriented(
    bytes: &[u8],
    rotation: RotationOption,
    options: DecodeOptions,
) -> Result<Raster> {
    let reader = match options.format {
        Some(format) => ImageReader::with_format(Cursor::new(bytes), format),
        None => ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|err| {
                ScanError::DecodeFailure(format!("failed to sniff image format: {err}"))
            })?,
    };
    let mut decoder = reader
        .into_decoder()
        .map_err(|err| ScanError::DecodeFailure(format!("unsupported image: {err}")))?;

    let orientation = match rotation {
        RotationOption::AutoExif => decoder.orientation().unwrap_or(Orientation::NoTransforms),
        RotationOption::Force(_) => Orientation::NoTransforms,
    };
    let mut image = DynamicImage::from_decoder(decoder)
        .map_err(|err| ScanError::DecodeFailure(format!("failed to decode image: {err}")))?;
    image.apply_orientation(orientation);
    debug!(width = image.width(), height = image.height(), ?orientation, "Image decoded");

    let raster = Raster::from_dynamic(image);
    match rotation {
        RotationOption::Force(degrees) => rotate(raster, degrees),
        RotationOption::AutoExif => Ok(raster),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use pagescan_core::ErrorKind;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut png = Vec::new();
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([0, 128, 255, 255])))
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        png
    }

    fn request(locator: Locator, degrees: i32) -> FetchRequest {
        FetchRequest {
            locator,
            rotation: RotationOption::from_degrees(degrees),
            cache: CachePolicy::disabled(),
            decode: DecodeOptions::default(),
        }
    }

    /// Serve exactly one HTTP response and hand back the raw request text.
    async fn serve_once(
        status: &'static str,
        body: Vec<u8>,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/page.png", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 1024];
            while !received.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
            }
            let head = format!(
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(head.as_bytes()).await;
            let _ = stream.write_all(&body).await;
            let _ = stream.shutdown().await;
            String::from_utf8_lossy(&received).to_string()
        });
        (url, handle)
    }

    /// An 8x4 JPEG whose EXIF block says "rotate 90 clockwise to display"
    /// (Orientation = 6).
    fn jpeg_with_exif_orientation_6() -> Vec<u8> {
        let mut jpeg = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 4, Rgb([90, 90, 90])))
            .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .unwrap();

        #[rustfmt::skip]
        let app1: [u8; 36] = [
            0xFF, 0xE1, 0x00, 0x22,
            b'E', b'x', b'i', b'f', 0x00, 0x00,
            // Big-endian TIFF header, first IFD at offset 8.
            b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08,
            // One entry: Orientation (0x0112), SHORT, count 1, value 6.
            0x00, 0x01,
            0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01, 0x00, 0x06, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ];
        // Splice APP1 in directly after SOI.
        jpeg.splice(2..2, app1);
        jpeg
    }

    #[test]
    fn exif_orientation_applied_without_forced_rotation() {
        let bytes = jpeg_with_exif_orientation_6();
        let raster = decode_oriented(&bytes, RotationOption::AutoExif, DecodeOptions::default())
            .unwrap();
        assert_eq!((raster.width(), raster.height()), (4, 8));
    }

    #[test]
    fn forced_rotation_ignores_exif() {
        let bytes = jpeg_with_exif_orientation_6();
        let raster = decode_oriented(&bytes, RotationOption::Force(180), DecodeOptions::default())
            .unwrap();
        assert_eq!((raster.width(), raster.height()), (8, 4));

        let raster = decode_oriented(&bytes, RotationOption::Force(90), DecodeOptions::default())
            .unwrap();
        assert_eq!((raster.width(), raster.height()), (4, 8));
    }

    #[test]
    fn rotation_option_from_degrees() {
        assert_eq!(RotationOption::from_degrees(0), RotationOption::AutoExif);
        assert_eq!(RotationOption::from_degrees(-90), RotationOption::Force(-90));
    }

    #[tokio::test]
    async fn reads_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        std::fs::write(&path, png_bytes(6, 4)).unwrap();

        let fetcher = PipelineFetcher::new(&FetchConfig::default()).unwrap();
        let mut source = fetcher.fetch(request(Locator::File(path), 0)).await.unwrap();
        let raster = source.take_result().unwrap();
        assert_eq!((raster.width(), raster.height()), (6, 4));

        source.close();
        assert!(source.is_closed());
    }

    #[tokio::test]
    async fn forced_rotation_is_applied_at_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        std::fs::write(&path, png_bytes(6, 4)).unwrap();

        let fetcher = PipelineFetcher::new(&FetchConfig::default()).unwrap();
        let mut source = fetcher.fetch(request(Locator::File(path), 90)).await.unwrap();
        let raster = source.take_result().unwrap();
        assert_eq!((raster.width(), raster.height()), (4, 6));
    }

    #[tokio::test]
    async fn missing_file_is_a_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = PipelineFetcher::new(&FetchConfig::default()).unwrap();
        let err = fetcher
            .fetch(request(Locator::File(dir.path().join("absent.jpg")), 0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeFailure);
    }

    #[tokio::test]
    async fn corrupt_bytes_fail_on_take() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.jpg");
        std::fs::write(&path, b"\xFF\xD8\xFF\xE0 truncated").unwrap();

        let fetcher = PipelineFetcher::new(&FetchConfig::default()).unwrap();
        let mut source = fetcher.fetch(request(Locator::File(path), 0)).await.unwrap();
        assert_eq!(source.take_result().unwrap_err().kind(), ErrorKind::DecodeFailure);
    }

    #[tokio::test]
    async fn closed_source_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        std::fs::write(&path, png_bytes(2, 2)).unwrap();

        let fetcher = PipelineFetcher::new(&FetchConfig::default()).unwrap();
        let mut source = fetcher.fetch(request(Locator::File(path), 0)).await.unwrap();
        source.close();
        source.close();
        assert_eq!(source.take_result().unwrap_err().kind(), ErrorKind::DecodeFailure);
    }

    #[tokio::test]
    async fn downloads_with_caching_disabled() {
        let (url, server) = serve_once("200 OK", png_bytes(3, 5)).await;

        let fetcher = PipelineFetcher::new(&FetchConfig::default()).unwrap();
        let mut source = fetcher.fetch(request(Locator::Remote(url), 0)).await.unwrap();
        let raster = source.take_result().unwrap();
        assert_eq!((raster.width(), raster.height()), (3, 5));

        let raw_request = server.await.unwrap().to_ascii_lowercase();
        assert!(raw_request.contains("cache-control: no-cache, no-store"), "{raw_request}");
        assert!(raw_request.contains("pragma: no-cache"), "{raw_request}");
        assert!(raw_request.contains("user-agent: pagescan/"), "{raw_request}");
    }

    #[tokio::test]
    async fn http_error_status_is_a_decode_failure() {
        let (url, server) = serve_once("404 Not Found", Vec::new()).await;

        let fetcher = PipelineFetcher::new(&FetchConfig::default()).unwrap();
        let err = fetcher.fetch(request(Locator::Remote(url), 0)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeFailure);
        server.await.unwrap();
    }
}
