use super::*;
use crate::resources::resolver::MemoryResolver;

fn id(s: &str) -> ResourceId {
    ResourceId::parse(s).unwrap()
}

fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([200, 100, 50, 255]));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn opts(parallel: bool) -> LoaderOpts {
    LoaderOpts {
        parallel,
        threads: Some(2),
        ..LoaderOpts::default()
    }
}

fn pack() -> MemoryResolver {
    let mut r = MemoryResolver::new();
    r.insert(&id("demo:a"), png_bytes(16, 16));
    r.insert(&id("demo:b"), b"definitely not a png".to_vec());
    r.insert(&id("demo:c"), png_bytes(8, 8));
    r
}

fn requested(names: &[&str]) -> HashSet<ResourceId> {
    names.iter().map(|n| id(n)).collect()
}

fn sorted_ids(infos: &[SpriteInfo]) -> Vec<String> {
    let mut ids: Vec<String> = infos.iter().map(|i| i.id.to_string()).collect();
    ids.sort();
    ids
}

#[test]
fn partial_failure_keeps_the_rest_of_the_batch() {
    for parallel in [true, false] {
        let resolver = pack();
        let loader = SpriteLoader::new(Arc::new(resolver.clone()), opts(parallel)).unwrap();
        let session = BuildSession::begin();

        let infos = loader.load(&session, &requested(&["demo:a", "demo:b", "demo:c"]));

        assert_eq!(sorted_ids(&infos), ["demo:a", "demo:c"]);
        assert_eq!(
            session.ids().iter().map(ToString::to_string).collect::<Vec<_>>(),
            ["demo:a", "demo:c"]
        );
        assert_eq!(resolver.opened_handles(), 3);
        assert_eq!(resolver.closed_handles(), 1);

        assert_eq!(session.finish(), 2);
        assert_eq!(resolver.closed_handles(), 3);
    }
}

#[test]
fn results_are_a_subset_of_requested_ids_with_registry_entries() {
    let loader = SpriteLoader::new(Arc::new(pack()), opts(true)).unwrap();
    let session = BuildSession::begin();
    let ids = requested(&["demo:a", "demo:b", "demo:c", "demo:absent"]);

    let infos = loader.load(&session, &ids);

    assert_eq!(infos.len(), session.len());
    for info in &infos {
        assert!(ids.contains(&info.id));
        assert!(session.contains(&info.id));
    }
}

#[test]
fn placeholder_is_never_loaded() {
    let placeholder = loader_placeholder();
    let mut resolver = pack();
    resolver.insert(&placeholder, png_bytes(4, 4));
    let loader = SpriteLoader::new(Arc::new(resolver.clone()), opts(true)).unwrap();
    let session = BuildSession::begin();

    let mut ids = requested(&["demo:a"]);
    ids.insert(placeholder.clone());
    let infos = loader.load(&session, &ids);

    assert_eq!(sorted_ids(&infos), ["demo:a"]);
    assert!(!session.contains(&placeholder));
    assert_eq!(resolver.opened_handles(), 1);
}

fn loader_placeholder() -> ResourceId {
    LoaderOpts::default().placeholder
}

#[test]
fn empty_batch_returns_nothing() {
    let loader = SpriteLoader::new(Arc::new(pack()), opts(true)).unwrap();
    let session = BuildSession::begin();
    assert!(loader.load(&session, &HashSet::new()).is_empty());
    assert!(session.is_empty());
}

#[test]
fn animated_sprite_reports_frame_size() {
    let mut resolver = MemoryResolver::new();
    let water = id("demo:water");
    resolver.insert_with_metadata(
        &water,
        png_bytes(16, 64),
        br#"{"animation": {"frametime": 3}}"#.to_vec(),
    );
    let loader = SpriteLoader::new(Arc::new(resolver), opts(false)).unwrap();

    let record = loader.load_one(&water).unwrap();
    assert_eq!((record.info.width, record.info.height), (16, 16));
    assert_eq!(record.info.animation.frame_time, 3);
    assert_eq!((record.image.width, record.image.height), (16, 64));
}

#[test]
fn bad_metadata_excludes_the_sprite_and_closes_its_handle() {
    let mut resolver = MemoryResolver::new();
    resolver.insert_with_metadata(&id("demo:lava"), png_bytes(16, 16), b"{ broken".to_vec());
    resolver.insert_with_metadata(
        &id("demo:odd"),
        png_bytes(16, 20),
        br#"{"animation": {"width": 16, "height": 16}}"#.to_vec(),
    );
    let loader = SpriteLoader::new(Arc::new(resolver.clone()), opts(true)).unwrap();
    let session = BuildSession::begin();

    let infos = loader.load(&session, &requested(&["demo:lava", "demo:odd"]));

    assert!(infos.is_empty());
    assert!(session.is_empty());
    assert_eq!(resolver.opened_handles(), 2);
    assert_eq!(resolver.closed_handles(), 2);
    assert!(loader.load_one(&id("demo:lava")).unwrap_err().is_metadata());
}

#[test]
fn missing_resource_is_not_found() {
    let loader = SpriteLoader::new(Arc::new(MemoryResolver::new()), opts(false)).unwrap();
    let err = loader.load_one(&id("demo:ghost")).unwrap_err();
    assert!(matches!(err, AtlasError::ResourceNotFound { .. }));
}

struct RejectAll;

impl ImageDecoder for RejectAll {
    fn decode(
        &self,
        id: &ResourceId,
        _bytes: &[u8],
    ) -> AtlasResult<crate::resources::decode::DecodedImage> {
        Err(AtlasError::decode(id, "rejected"))
    }
}

#[test]
fn custom_decoder_is_used() {
    let resolver = pack();
    let loader = SpriteLoader::new(Arc::new(resolver.clone()), opts(true))
        .unwrap()
        .with_decoder(Arc::new(RejectAll));
    let session = BuildSession::begin();

    assert!(loader.load(&session, &requested(&["demo:a", "demo:c"])).is_empty());
    assert_eq!(resolver.closed_handles(), resolver.opened_handles());
}

#[test]
fn zero_threads_is_rejected() {
    let opts = LoaderOpts {
        threads: Some(0),
        ..LoaderOpts::default()
    };
    let err = SpriteLoader::new(Arc::new(MemoryResolver::new()), opts).err().unwrap();
    assert!(matches!(err, AtlasError::Validation(_)));
}

#[test]
fn sequential_mode_builds_no_pool() {
    let loader = SpriteLoader::new(Arc::new(MemoryResolver::new()), opts(false)).unwrap();
    assert!(loader.pool.is_none());
    assert!(!loader.opts().parallel);
}

/// Decodes normally but sleeps inside the call, tracking overlap and worker names.
#[derive(Default)]
struct SlowDecoder {
    in_flight: std::sync::atomic::AtomicUsize,
    max_in_flight: std::sync::atomic::AtomicUsize,
    threads: parking_lot::Mutex<Vec<String>>,
}

impl ImageDecoder for SlowDecoder {
    fn decode(
        &self,
        id: &ResourceId,
        bytes: &[u8],
    ) -> AtlasResult<crate::resources::decode::DecodedImage> {
        use std::sync::atomic::Ordering;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let name = std::thread::current().name().unwrap_or("").to_string();
        self.threads.lock().push(name);
        std::thread::sleep(std::time::Duration::from_millis(50));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        crate::resources::decode::decode_image(id, bytes)
    }
}

#[test]
fn parallel_batch_fans_out_onto_the_worker_pool() {
    let mut resolver = MemoryResolver::new();
    for name in ["demo:w", "demo:x", "demo:y", "demo:z"] {
        resolver.insert(&id(name), png_bytes(2, 2));
    }
    let decoder = Arc::new(SlowDecoder::default());
    let loader = SpriteLoader::new(Arc::new(resolver), opts(true))
        .unwrap()
        .with_decoder(decoder.clone());
    let session = BuildSession::begin();

    let infos = loader.load(&session, &requested(&["demo:w", "demo:x", "demo:y", "demo:z"]));

    assert_eq!(infos.len(), 4);
    assert!(
        decoder
            .max_in_flight
            .load(std::sync::atomic::Ordering::SeqCst)
            >= 2
    );
    let threads = decoder.threads.lock();
    assert_eq!(threads.len(), 4);
    assert!(threads.iter().all(|t| t.starts_with("sprite-load-")));
}

/// Decodes normally except for `demo:c`, where it panics.
struct PanicOnC;

impl ImageDecoder for PanicOnC {
    fn decode(
        &self,
        id: &ResourceId,
        bytes: &[u8],
    ) -> AtlasResult<crate::resources::decode::DecodedImage> {
        if id.path() == "c" {
            panic!("decoder bug for {id}");
        }
        crate::resources::decode::decode_image(id, bytes)
    }
}

#[test]
fn panicking_sprite_is_left_out_of_the_batch() {
    for parallel in [true, false] {
        let resolver = pack();
        let loader = SpriteLoader::new(Arc::new(resolver.clone()), opts(parallel))
            .unwrap()
            .with_decoder(Arc::new(PanicOnC));
        let session = BuildSession::begin();

        let infos = loader.load(&session, &requested(&["demo:a", "demo:c"]));

        assert_eq!(sorted_ids(&infos), ["demo:a"]);
        assert!(!session.contains(&id("demo:c")));
        assert_eq!(resolver.opened_handles(), 2);
        assert_eq!(resolver.closed_handles(), 1);
        session.finish();
        assert_eq!(resolver.closed_handles(), 2);
    }
}

#[test]
fn panic_message_reads_str_and_string_payloads() {
    let s: Box<dyn Any + Send> = Box::new("static");
    assert_eq!(panic_message(s.as_ref()), "static");
    let s: Box<dyn Any + Send> = Box::new(String::from("owned"));
    assert_eq!(panic_message(s.as_ref()), "owned");
    let s: Box<dyn Any + Send> = Box::new(7u8);
    assert_eq!(panic_message(s.as_ref()), "non-string panic payload");
}
