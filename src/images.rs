use crate::debug::DebugRun;
use crate::model::{Photo, PhotoSource};
use crate::pdf::flate_compress;
use base64::Engine;
use image::GenericImageView;
use rayon::prelude::*;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

// Upper bound for a single downloaded photo.
const MAX_PHOTO_BYTES: u64 = 32 * 1024 * 1024;

/// Loads the raw bytes behind a photo location. Implementations are called
/// from the fetch pool and must be thread-safe.
pub trait PhotoFetcher: Send + Sync {
    fn fetch(&self, location: &str) -> io::Result<Vec<u8>>;
}

/// Fetches `http(s)://` URLs with a blocking agent and decodes `data:` URIs.
/// Local files are only read when a root directory was granted with
/// [`DefaultPhotoFetcher::with_root`], and only from inside it.
pub struct DefaultPhotoFetcher {
    agent: ureq::Agent,
    local_root: Option<PathBuf>,
}

impl DefaultPhotoFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            local_root: None,
        }
    }

    pub fn with_root(mut self, root: impl AsRef<Path>) -> io::Result<Self> {
        self.local_root = Some(root.as_ref().canonicalize()?);
        Ok(self)
    }

    // Absent, out-of-root and unsupported locations fail with the same error.
    fn read_local(&self, location: &str) -> io::Result<Vec<u8>> {
        let Some(root) = &self.local_root else {
            return Err(unsupported_location());
        };
        let relative = location.strip_prefix("file://").unwrap_or(location);
        let resolved = root
            .join(relative)
            .canonicalize()
            .map_err(|_| unsupported_location())?;
        if !resolved.starts_with(root) || !resolved.is_file() {
            return Err(unsupported_location());
        }
        std::fs::read(resolved)
    }
}

fn unsupported_location() -> io::Error {
    io::Error::new(io::ErrorKind::PermissionDenied, "unsupported photo location")
}

impl Default for DefaultPhotoFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(15))
    }
}

impl PhotoFetcher for DefaultPhotoFetcher {
    fn fetch(&self, location: &str) -> io::Result<Vec<u8>> {
        if location.starts_with("data:") {
            return parse_data_uri(location)
                .map(|(_, data)| data)
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "malformed data URI"));
        }
        if location.starts_with("http://") || location.starts_with("https://") {
            let response = self
                .agent
                .get(location)
                .call()
                .map_err(|err| io::Error::other(err.to_string()))?;
            let mut bytes = Vec::new();
            response
                .into_reader()
                .take(MAX_PHOTO_BYTES)
                .read_to_end(&mut bytes)?;
            return Ok(bytes);
        }
        self.read_local(location)
    }
}

pub(crate) struct ImageData {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) color_space: &'static str,
    pub(crate) bits_per_component: u8,
    pub(crate) filter: &'static str,
    pub(crate) data: Vec<u8>,
    pub(crate) alpha: Option<AlphaData>,
}

pub(crate) struct AlphaData {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) bits_per_component: u8,
    pub(crate) filter: &'static str,
    pub(crate) data: Vec<u8>,
}

pub(crate) enum PhotoData {
    Ready {
        resource_id: String,
        image: ImageData,
    },
    /// No bytes could be obtained.
    Missing,
    /// Bytes were obtained but are not a supported image.
    Undecodable,
}

pub(crate) struct ResolvedPhoto {
    pub(crate) name: String,
    pub(crate) data: PhotoData,
}

/// Resolves every photo on `pool`, keeping input order. Failures degrade to
/// placeholders and are logged; they never abort the batch.
pub(crate) fn resolve_photos(
    photos: &[Photo],
    fetcher: &dyn PhotoFetcher,
    pool: &rayon::ThreadPool,
    debug: Option<&DebugRun<'_>>,
) -> Vec<ResolvedPhoto> {
    if photos.is_empty() {
        return Vec::new();
    }
    pool.install(|| {
        photos
            .par_iter()
            .enumerate()
            .map(|(index, photo)| resolve_photo(index, photo, fetcher, debug))
            .collect()
    })
}

fn resolve_photo(
    index: usize,
    photo: &Photo,
    fetcher: &dyn PhotoFetcher,
    debug: Option<&DebugRun<'_>>,
) -> ResolvedPhoto {
    let unavailable = |reason: &str| {
        log::warn!("photo {} ({}) unavailable: {}", index + 1, photo.name, reason);
        if let Some(debug) = debug {
            debug.photo_unavailable(index, &photo.name, reason);
        }
    };
    let fetched = match &photo.source {
        PhotoSource::Missing => Err("no image data".to_string()),
        PhotoSource::Bytes(bytes) => Ok(bytes.clone()),
        PhotoSource::Url(location) => fetcher
            .fetch(location)
            .map_err(|err| format!("fetch failed: {}", err)),
    };
    let data = match fetched {
        Ok(bytes) if bytes.is_empty() => {
            unavailable("empty image data");
            PhotoData::Missing
        }
        Ok(bytes) => match decode_image_bytes(&bytes) {
            Some(image) => PhotoData::Ready {
                resource_id: format!("Im{}", index + 1),
                image,
            },
            None => {
                unavailable("image could not be decoded");
                PhotoData::Undecodable
            }
        },
        Err(reason) => {
            unavailable(&reason);
            PhotoData::Missing
        }
    };
    ResolvedPhoto {
        name: photo.name.clone(),
        data,
    }
}

/// Decodes PNG/JPEG bytes into a PDF-ready image. JPEG streams pass through
/// unchanged; everything else becomes flate-compressed RGB plus an optional
/// soft mask.
pub(crate) fn decode_image_bytes(data: &[u8]) -> Option<ImageData> {
    let format = image::guess_format(data).ok()?;
    let decoded = image::load_from_memory_with_format(data, format).ok()?;
    let (width, height) = decoded.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    if format == image::ImageFormat::Jpeg {
        let color_space = match decoded.color() {
            image::ColorType::L8 | image::ColorType::La8 => "/DeviceGray",
            _ => "/DeviceRGB",
        };
        return Some(ImageData {
            width,
            height,
            color_space,
            bits_per_component: 8,
            filter: "/DCTDecode",
            data: data.to_vec(),
            alpha: None,
        });
    }

    let rgba = decoded.to_rgba8();
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    let mut has_alpha = false;
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        if a != 255 {
            has_alpha = true;
        }
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
    }

    let alpha = has_alpha.then(|| AlphaData {
        width,
        height,
        bits_per_component: 8,
        filter: "/FlateDecode",
        data: flate_compress(&alpha),
    });
    Some(ImageData {
        width,
        height,
        color_space: "/DeviceRGB",
        bits_per_component: 8,
        filter: "/FlateDecode",
        data: flate_compress(&rgb),
        alpha,
    })
}

pub(crate) fn parse_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let rest = uri.strip_prefix("data:")?;
    let (header, data_part) = rest.split_once(',')?;
    let mime = header
        .split(';')
        .next()
        .filter(|mime| !mime.is_empty())
        .unwrap_or("application/octet-stream")
        .to_string();
    let data = if header.contains("base64") {
        base64::engine::general_purpose::STANDARD
            .decode(data_part.trim())
            .ok()?
    } else {
        data_part.as_bytes().to_vec()
    };
    Some((mime, data))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) fn png_bytes(width: u32, height: u32, alpha: u8) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 120, 40, alpha]));
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    /// Serves canned bytes per location; anything else fails like a 404.
    pub(crate) struct MapFetcher {
        pub(crate) entries: HashMap<String, Vec<u8>>,
        pub(crate) calls: AtomicUsize,
    }

    impl MapFetcher {
        pub(crate) fn new(entries: &[(&str, Vec<u8>)]) -> Self {
            Self {
                entries: entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PhotoFetcher for MapFetcher {
        fn fetch(&self, location: &str) -> io::Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entries
                .get(location)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "404 Not Found"))
        }
    }

    fn pool(threads: usize) -> rayon::ThreadPool {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap()
    }

    #[test]
    fn resolution_keeps_order_and_isolates_failures() {
        let fetcher = MapFetcher::new(&[
            ("https://cdn/a.png", png_bytes(4, 3, 255)),
            ("https://cdn/c.png", png_bytes(3, 4, 255)),
        ]);
        let photos = vec![
            Photo::from_url("a", "https://cdn/a.png"),
            Photo::from_url("b", "https://cdn/unreachable.png"),
            Photo::from_url("c", "https://cdn/c.png"),
            Photo::missing("d"),
            Photo::from_bytes("e", b"not an image".to_vec()),
        ];
        let resolved = resolve_photos(&photos, &fetcher, &pool(4), None);
        let names: Vec<&str> = resolved.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d", "e"]);
        assert!(matches!(resolved[0].data, PhotoData::Ready { .. }));
        assert!(matches!(resolved[1].data, PhotoData::Missing));
        assert!(matches!(resolved[2].data, PhotoData::Ready { .. }));
        assert!(matches!(resolved[3].data, PhotoData::Missing));
        assert!(matches!(resolved[4].data, PhotoData::Undecodable));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
        match &resolved[2].data {
            PhotoData::Ready { resource_id, image } => {
                assert_eq!(resource_id, "Im3");
                assert_eq!((image.width, image.height), (3, 4));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn translucent_png_gets_soft_mask() {
        let opaque = decode_image_bytes(&png_bytes(2, 2, 255)).unwrap();
        assert!(opaque.alpha.is_none());
        assert_eq!(opaque.filter, "/FlateDecode");
        let translucent = decode_image_bytes(&png_bytes(2, 2, 128)).unwrap();
        assert!(translucent.alpha.is_some());
    }

    #[test]
    fn jpeg_bytes_pass_through() {
        let img = image::RgbImage::from_pixel(8, 6, image::Rgb([10, 20, 30]));
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Jpeg)
            .unwrap();
        let bytes = out.into_inner();
        let decoded = decode_image_bytes(&bytes).unwrap();
        assert_eq!(decoded.filter, "/DCTDecode");
        assert_eq!(decoded.data, bytes);
        assert_eq!((decoded.width, decoded.height), (8, 6));
    }

    #[test]
    fn data_uris_decode_through_default_fetcher() {
        let png = png_bytes(1, 1, 255);
        let uri = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&png)
        );
        let fetched = DefaultPhotoFetcher::default().fetch(&uri).unwrap();
        assert_eq!(fetched, png);
        assert_eq!(parse_data_uri("data:,hello").unwrap().0, "application/octet-stream");
        assert!(parse_data_uri("https://cdn/a.png").is_none());
    }

    #[test]
    fn local_reads_need_a_granted_root() {
        let root = std::env::temp_dir().join(format!("relatorio_photos_{}", std::process::id()));
        std::fs::create_dir_all(&root).unwrap();
        let path = root.join("fachada.png");
        std::fs::write(&path, png_bytes(2, 2, 255)).unwrap();
        let outside = std::env::temp_dir().join(format!("relatorio_secret_{}.png", std::process::id()));
        std::fs::write(&outside, png_bytes(2, 2, 255)).unwrap();

        let closed = DefaultPhotoFetcher::default();
        let absolute = format!("file://{}", path.display());
        assert_eq!(
            closed.fetch(&absolute).unwrap_err().kind(),
            io::ErrorKind::PermissionDenied
        );
        assert!(closed.fetch(&path.display().to_string()).is_err());

        let rooted = DefaultPhotoFetcher::default().with_root(&root).unwrap();
        assert!(!rooted.fetch("fachada.png").unwrap().is_empty());
        assert!(!rooted.fetch("file://fachada.png").unwrap().is_empty());
        assert!(!rooted.fetch(&absolute).unwrap().is_empty());

        let escape = format!("../{}", outside.file_name().unwrap().to_string_lossy());
        let denied = rooted.fetch(&escape).unwrap_err();
        let missing = rooted.fetch("nao-existe.png").unwrap_err();
        assert_eq!(denied.kind(), io::ErrorKind::PermissionDenied);
        assert_eq!(denied.to_string(), missing.to_string());
        assert!(rooted.fetch(&outside.display().to_string()).is_err());

        let _ = std::fs::remove_file(&outside);
        let _ = std::fs::remove_dir_all(&root);
    }
}
