mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use common::{serve, Reply};
use parking_lot::Mutex;
use mediagrid::data::{mock_photo, mock_video};
use mediagrid::pexels::MediaItem;
use mediagrid::prefetch::{Config, Manager};
use mediagrid::viewer::{Direction, ViewerController, ViewerOptions};

#[test]
fn warms_images_and_reports_failures() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let base = serve(move |url, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        if url == "/ok.jpg" {
            Reply::json("jpeg-bytes")
        } else {
            Reply::status(404, "missing")
        }
    });

    let manager = Manager::new(Config {
        workers: 1,
        ..Config::default()
    })
    .unwrap();

    let ok = manager
        .enqueue(&format!("{base}/ok.jpg"))
        .recv_timeout(Duration::from_secs(5))
        .unwrap();
    let fetched = ok.fetched.expect("fetched");
    assert_eq!(fetched.bytes.as_slice(), b"jpeg-bytes");
    assert!(manager.get(&format!("{base}/ok.jpg")).is_some());

    let again = manager
        .enqueue(&format!("{base}/ok.jpg"))
        .recv_timeout(Duration::from_secs(5))
        .unwrap();
    assert!(again.fetched.is_some());
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    let missing = manager
        .enqueue(&format!("{base}/missing.jpg"))
        .recv_timeout(Duration::from_secs(5))
        .unwrap();
    assert!(missing.error.is_some());
    assert!(manager.get(&format!("{base}/missing.jpg")).is_none());
}

fn served_photo(id: u64, base: &str) -> MediaItem {
    let mut item = mock_photo(id, "photo");
    if let MediaItem::Photo(photo) = &mut item {
        photo.src.large2x = format!("{base}/photos/{id}/large2x.jpg");
    }
    item
}

fn served_video(id: u64, base: &str) -> MediaItem {
    let mut item = mock_video(id, "video");
    if let MediaItem::Video(video) = &mut item {
        video.video_pictures[0].picture = format!("{base}/videos/{id}/picture-0.jpg");
    }
    item
}

fn wait_until_warm(manager: &Manager, url: &str) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if manager.get(url).is_some() {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    false
}

#[test]
fn viewer_drives_prefetcher_without_waiting() {
    let requested = Arc::new(Mutex::new(Vec::new()));
    let log = requested.clone();
    let base = serve(move |url, _| {
        log.lock().push(url.to_string());
        Reply::json("image-bytes")
    });

    let manager = Arc::new(
        Manager::new(Config {
            workers: 1,
            timeout: Duration::from_secs(5),
            ..Config::default()
        })
        .unwrap(),
    );
    let items = vec![
        served_photo(1, &base),
        served_video(2, &base),
        served_photo(3, &base),
    ];
    let mut viewer =
        ViewerController::open(items, 0, ViewerOptions::default(), manager.clone()).unwrap();

    let picture = format!("{base}/videos/2/picture-0.jpg");
    assert_eq!(viewer.preload_neighbors(), vec![picture.clone()]);
    assert!(wait_until_warm(&manager, &picture));

    viewer.advance(Direction::Next);
    assert_eq!(viewer.index(), 1);
    let next = format!("{base}/photos/3/large2x.jpg");
    assert!(wait_until_warm(&manager, &next));
    assert!(manager.get(&format!("{base}/photos/1/large2x.jpg")).is_some());

    let requested = requested.lock().clone();
    assert_eq!(
        requested.iter().filter(|url| url.as_str() == "/videos/2/picture-0.jpg").count(),
        1
    );
    assert!(requested.contains(&"/photos/3/large2x.jpg".to_string()));
}

#[test]
fn detach_does_not_wait_for_slow_downloads() {
    let base = serve(|_, _| {
        thread::sleep(Duration::from_secs(3));
        Reply::json("late")
    });
    let manager = Manager::new(Config {
        workers: 1,
        ..Config::default()
    })
    .unwrap();
    let pending = manager.enqueue(&format!("{base}/slow.jpg"));
    thread::sleep(Duration::from_millis(100));

    let started = Instant::now();
    manager.detach();
    assert!(started.elapsed() < Duration::from_secs(1));
    drop(pending);
}
