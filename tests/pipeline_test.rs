mod common;

use color_eyre::eyre::eyre;
use common::{app_with, pump, scan_all, ScriptedBackend};
use lscan::backend::ScanPoint;
use lscan::interaction::Action;
use lscan::{AppEvent, AppOptions, BackendRequest, BackendResponse, Payload, ViewMode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

fn options(modulus: u64, view: ViewMode) -> AppOptions {
    AppOptions {
        modulus,
        view,
        ..AppOptions::default()
    }
}

fn overlay_backend() -> ScriptedBackend<impl Fn(&BackendRequest) -> color_eyre::Result<BackendResponse>> {
    ScriptedBackend(|request: &BackendRequest| match request {
        BackendRequest::ScanAll { modulus, .. } => Ok(BackendResponse::Data(Payload::ScanAll(
            scan_all(*modulus, 0.0),
        ))),
        other => Err(eyre!("unexpected {}", other.path())),
    })
}

#[test]
fn test_overlay_renders_one_primary_chart() {
    let (mut app, rx) = app_with(overlay_backend(), options(5, ViewMode::Overlay));
    app.event(AppEvent::Refresh);
    assert!(app.is_loading());
    pump(&mut app, &rx, 1);

    assert!(!app.is_loading());
    let primary = app.charts().primary().expect("overlay chart");
    assert_eq!(primary.spec.title, "log|L(0.5+it)| for all characters mod 5");
    assert_eq!(primary.spec.series.len(), 4);
    assert_eq!(primary.spec.series[0].label, "Chi 1 (Principal)");
    assert_eq!(app.charts().secondary_count(), 0);
}

#[test]
fn test_grid_and_overlay_swap_surfaces() {
    let (mut app, rx) = app_with(overlay_backend(), options(7, ViewMode::Grid));
    app.event(AppEvent::Refresh);
    pump(&mut app, &rx, 1);

    let phi = lscan::residues::totient(7) as usize;
    assert_eq!(app.charts().secondary_count(), phi);
    assert!(app.charts().primary().is_none());
    assert!(app.charts().live_count() <= 1 + phi);

    // grid -> clt -> overlay, refetching each time
    assert!(matches!(
        app.apply(Action::CycleView { forward: true }),
        Some(AppEvent::Refresh)
    ));
    assert_eq!(app.view(), ViewMode::Clt);
    app.apply(Action::CycleView { forward: false });
    app.apply(Action::CycleView { forward: false });
    assert_eq!(app.view(), ViewMode::Overlay);
    app.event(AppEvent::Refresh);
    pump(&mut app, &rx, 1);

    assert_eq!(app.charts().secondary_count(), 0);
    assert!(app.charts().primary().is_some());
    let charts = app.charts();
    assert_eq!(
        charts.created() - charts.destroyed(),
        charts.live_count() as u64
    );
}

#[test]
fn test_only_latest_request_renders() {
    let calls = AtomicUsize::new(0);
    let backend = ScriptedBackend(move |request: &BackendRequest| {
        let BackendRequest::ScanAll { modulus, .. } = request else {
            return Err(eyre!("unexpected request"));
        };
        // the first request answers last
        let offset = if calls.fetch_add(1, Ordering::SeqCst) == 0 {
            thread::sleep(Duration::from_millis(300));
            1.0
        } else {
            2.0
        };
        Ok(BackendResponse::Data(Payload::ScanAll(scan_all(
            *modulus, offset,
        ))))
    });
    let (mut app, rx) = app_with(backend, options(3, ViewMode::Overlay));

    app.event(AppEvent::Refresh);
    thread::sleep(Duration::from_millis(50));
    app.event(AppEvent::Refresh);
    pump(&mut app, &rx, 2);

    assert!(!app.is_loading());
    assert_eq!(app.requests().stale_dropped(), 1);
    let primary = app.charts().primary().expect("chart");
    assert_eq!(primary.spec.series[0].points[0], (0.0, 2.0));
    // one chart created for the one accepted response
    assert_eq!(app.charts().created(), 1);
}

#[test]
fn test_backend_error_leaves_chart_untouched() {
    let calls = AtomicUsize::new(0);
    let backend = ScriptedBackend(move |request: &BackendRequest| {
        let BackendRequest::ScanAll { modulus, .. } = request else {
            return Err(eyre!("unexpected request"));
        };
        if calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(BackendResponse::Data(Payload::ScanAll(scan_all(
                *modulus, 0.0,
            ))))
        } else {
            Ok(BackendResponse::Error("modulus too large".to_string()))
        }
    });
    let (mut app, rx) = app_with(backend, options(5, ViewMode::Overlay));
    app.event(AppEvent::Refresh);
    pump(&mut app, &rx, 1);
    let id = app.charts().primary().map(|c| c.id);

    app.event(AppEvent::Refresh);
    pump(&mut app, &rx, 1);

    assert!(!app.is_loading());
    assert_eq!(app.last_error(), Some("modulus too large"));
    assert_eq!(app.charts().primary().map(|c| c.id), id);
    assert_eq!(app.requests().failures(), 1);
}

#[test]
fn test_panicking_worker_still_clears_loading() {
    let backend = ScriptedBackend(|_: &BackendRequest| -> color_eyre::Result<BackendResponse> {
        panic!("backend blew up")
    });
    let (mut app, rx) = app_with(backend, options(5, ViewMode::Overlay));
    app.event(AppEvent::Refresh);
    pump(&mut app, &rx, 1);
    assert!(!app.is_loading());
    assert!(app.last_error().is_some());
}

#[test]
fn test_real_view_requests_scan_and_zooms() {
    let backend = ScriptedBackend(|request: &BackendRequest| match request {
        BackendRequest::Scan(q) => {
            assert_eq!(q.steps, lscan::request::scan_steps(q.start, q.end));
            let points = (0..=4)
                .map(|i| ScanPoint {
                    t: q.start + i as f64 * (q.end - q.start) / 4.0,
                    re: Some(i as f64),
                    im: None,
                })
                .collect();
            Ok(BackendResponse::Data(Payload::Scan(points)))
        }
        other => Err(eyre!("unexpected {}", other.path())),
    });
    let (mut app, rx) = app_with(backend, options(5, ViewMode::Real));
    app.event(AppEvent::Refresh);
    pump(&mut app, &rx, 1);
    assert!(app.charts().primary().is_some());

    let follow = app.apply(Action::ZoomTo(50.0));
    assert!(matches!(follow, Some(AppEvent::Refresh)));
    assert_eq!(app.viewport().start(), 37.5);
    assert_eq!(app.viewport().end(), 62.5);
    app.event(AppEvent::Refresh);
    pump(&mut app, &rx, 1);

    let primary = app.charts().primary().unwrap();
    assert_eq!(primary.spec.series[0].points.first(), Some(&(37.5, 0.0)));
    assert_eq!(primary.spec.x_labels.first().map(String::as_str), Some("37.5000"));
}

#[test]
fn test_clt_view_builds_histogram() {
    let backend = ScriptedBackend(|request: &BackendRequest| match request {
        BackendRequest::Clt { samples, .. } => {
            let mut values: Vec<f64> = (0..*samples)
                .map(|i| -2.0 + 4.0 * i as f64 / *samples as f64)
                .collect();
            values.push(-999.0);
            Ok(BackendResponse::Data(Payload::Clt(values)))
        }
        other => Err(eyre!("unexpected {}", other.path())),
    });
    let (mut app, rx) = app_with(backend, options(5, ViewMode::Clt));
    app.event(AppEvent::Refresh);
    pump(&mut app, &rx, 1);

    let summary = app.histogram_summary().expect("summary");
    assert!(summary.starts_with("n=1000/1001"), "{}", summary);
    let primary = app.charts().primary().expect("histogram");
    assert_eq!(primary.spec.series.len(), 2);
    assert!(!primary.spec.options.zoom_on_click);
}

#[test]
fn test_point_evaluation_does_not_disturb_scans() {
    let backend = ScriptedBackend(|request: &BackendRequest| match request {
        BackendRequest::ScanAll { modulus, .. } => Ok(BackendResponse::Data(
            Payload::ScanAll(scan_all(*modulus, 0.0)),
        )),
        BackendRequest::Point {
            real_part,
            imag,
            modulus,
        } => Ok(BackendResponse::Data(Payload::Point(lscan::PointValue {
            result: "1.0 + 0.5j".to_string(),
            modulus: *modulus,
            s_real: *real_part,
            s_imag: *imag,
        }))),
        other => Err(eyre!("unexpected {}", other.path())),
    });
    let (mut app, rx) = app_with(backend, options(5, ViewMode::Overlay));
    app.event(AppEvent::Refresh);
    app.apply(Action::EvaluatePoint);
    pump(&mut app, &rx, 2);

    assert_eq!(app.requests().stale_dropped(), 0);
    assert!(app.charts().primary().is_some());
    let point = app.point().expect("point value");
    assert_eq!(point.s_imag, 50.0);
    assert_eq!(point.s_real, 0.5);
}

#[test]
fn test_character_shortcut_clamps_and_refetches() {
    let (mut app, _rx) = app_with(overlay_backend(), options(5, ViewMode::Overlay));
    assert!(app.apply(Action::CharacterStep(-1)).is_none());
    for _ in 0..3 {
        assert!(matches!(
            app.apply(Action::CharacterStep(1)),
            Some(AppEvent::Refresh)
        ));
    }
    assert_eq!(app.selector().selected(), 4);
    assert!(app.apply(Action::CharacterStep(1)).is_none());

    // 4 survives a change to q = 10 (phi = 4); q = 3 drops back to 1
    app.apply(Action::ModulusStep(5));
    assert_eq!(app.selector().selected(), 4);
    app.apply(Action::ModulusStep(-7));
    assert_eq!(app.selector().selected(), 1);
}
