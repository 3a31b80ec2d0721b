//! End-to-end Read-from-Write runs over scene files on a temp filesystem.

use std::fs;
use std::path::Path;

use readback::session::{ConfirmPolicy, Scene, Session};
use readback::{FrameRange, KnobValue, RangeSource, Settings, read_from_write};
use tempfile::TempDir;

fn unix(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn touch_frames(dir: &Path, prefix: &str, frames: impl Iterator<Item = i64>, pad: usize, ext: &str) {
    fs::create_dir_all(dir).unwrap();
    for f in frames {
        fs::write(dir.join(format!("{}{:0pad$}.{}", prefix, f, ext, pad = pad)), b"").unwrap();
    }
}

fn load(json: &str) -> Session {
    let scene: Scene = serde_json::from_str(json).unwrap();
    Session::from_scene(scene).unwrap()
}

#[test]
fn project_relative_write_becomes_relative_read() {
    let tmp = TempDir::new().unwrap();
    let root = unix(tmp.path());
    touch_frames(&tmp.path().join("renders/comp"), "sh010_comp.", 1001..=1024, 4, "exr");

    let json = format!(
        r#"{{
            "root": {{ "project_directory": "{root}", "first_frame": 1001, "last_frame": 1100, "frame": 1 }},
            "nodes": [
                {{ "name": "Write1", "class": "Write", "xpos": -40, "ypos": 300, "height": 30,
                   "knobs": {{ "file": "renders/comp/sh010_comp.####.exr", "colorspace": "ACES - ACEScg",
                              "premultiplied": true, "channels": "rgba" }} }}
            ],
            "selected": ["Write1"]
        }}"#
    );
    let mut session = load(&json);

    let report = read_from_write(&mut session, &Settings::default());
    assert!(report.failed.is_empty(), "{:?}", report.failed);
    assert_eq!(report.created.len(), 1);

    let created = &report.created[0];
    assert_eq!(created.info.path, "./renders/comp/sh010_comp.####.exr");
    assert_eq!(created.info.range, FrameRange::new(1001, 1024));
    assert_eq!(created.info.range_source, RangeSource::Disk);

    let reader = session.node(&created.reader).unwrap();
    assert_eq!(reader.xpos, -40);
    assert_eq!(reader.ypos, 300 + 30 + 20);
    assert_eq!(reader.knobs["file"], KnobValue::Str("./renders/comp/sh010_comp.####.exr".into()));
    assert_eq!(reader.knobs["colorspace"], KnobValue::Str("ACES - ACEScg".into()));
    assert_eq!(reader.knobs["premultiplied"], KnobValue::Bool(true));
    assert!(!reader.knobs.contains_key("channels"));
    assert!(session.prompts().is_empty());
}

#[test]
fn read_node_keeps_its_own_range() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("plates");
    touch_frames(&dir, "plate_", 1..=48, 3, "dpx");

    let mut session = load(&format!(
        r#"{{
            "nodes": [
                {{ "name": "Read1", "class": "Read",
                   "knobs": {{ "file": "{}/plate_001.dpx", "first": 5, "last": 12, "raw": true }} }}
            ],
            "selected": ["Read1"]
        }}"#,
        unix(&dir)
    ));

    let report = read_from_write(&mut session, &Settings::default());
    let created = &report.created[0];
    assert_eq!(created.reader, "Read2");
    assert_eq!(created.info.range, FrameRange::new(5, 12));
    assert_eq!(created.info.range_source, RangeSource::Metadata);
    assert!(created.info.path.ends_with("/plates/plate_###.dpx"));
    assert_eq!(session.node("Read2").unwrap().knobs["raw"], KnobValue::Bool(true));
}

#[test]
fn movie_path_is_kept_verbatim() {
    let tmp = TempDir::new().unwrap();
    let movie = tmp.path().join("review/sh010_v003.mov");
    fs::create_dir_all(movie.parent().unwrap()).unwrap();
    fs::write(&movie, b"").unwrap();

    let mut session = load(&format!(
        r#"{{
            "root": {{ "first_frame": 1001, "last_frame": 1010 }},
            "nodes": [ {{ "name": "Write2", "class": "Write", "knobs": {{ "file": "{}" }} }} ],
            "selected": ["Write2"]
        }}"#,
        unix(&movie)
    ));

    let report = read_from_write(&mut session, &Settings::default());
    let info = &report.created[0].info;
    assert_eq!(info.path, unix(&movie));
    assert!(!info.path.contains('#'));
    assert_eq!(info.range, FrameRange::new(1001, 1010));
}

#[test]
fn missing_render_asks_and_falls_back_upstream() {
    let mut session = load(
        r#"{
            "root": { "project_directory": "/nonexistent/show", "first_frame": 1, "last_frame": 100 },
            "nodes": [
                { "name": "Read1", "class": "Read", "knobs": { "file": "/nonexistent/in.####.exr", "first": 101, "last": 180 } },
                { "name": "Write1", "class": "Write", "input": "Read1",
                  "knobs": { "file": "out/sh010.%04d.exr", "use_limit": false, "first": 1, "last": 2 } }
            ],
            "selected": ["Write1"]
        }"#,
    );
    session.set_confirm_policy(ConfirmPolicy::Yes);

    let report = read_from_write(&mut session, &Settings::default());
    assert_eq!(session.prompts().len(), 1);
    assert!(session.prompts()[0].contains("Write1.file"));

    let info = &report.created[0].info;
    assert_eq!(info.range, FrameRange::new(101, 180));
    assert_eq!(info.range_source, RangeSource::Upstream);
    assert_eq!(info.path, "./out/sh010.####.exr");
}

#[test]
fn declined_and_failed_items_leave_no_readers() {
    let mut session = load(
        r#"{
            "root": { "project_directory": "/nonexistent/show" },
            "nodes": [
                { "name": "Write1", "class": "Write", "knobs": { "file": "out/a.####.exr" } },
                { "name": "Write2", "class": "Write", "knobs": { "file": "out/noframes.exr" } },
                { "name": "Blur1", "class": "Blur", "knobs": { "size": 4 } }
            ],
            "selected": ["Write1", "Write2", "Blur1"]
        }"#,
    );
    session.set_confirm_policy(ConfirmPolicy::No);

    let report = read_from_write(&mut session, &Settings::default());
    assert!(report.created.is_empty());
    assert_eq!(report.declined.len(), 1);
    assert_eq!(report.declined[0].source, "Write1");
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].source, "Write2");
    assert!(session.nodes().all(|n| n.class != "Read"));
}

#[test]
fn updated_scene_round_trips_through_disk() {
    let tmp = TempDir::new().unwrap();
    touch_frames(&tmp.path().join("r"), "x.", 7..=9, 2, "png");

    let mut session = load(&format!(
        r#"{{
            "nodes": [ {{ "name": "Write1", "class": "Write", "knobs": {{ "file": "{}/r/x.07.png" }} }} ],
            "selected": ["Write1"]
        }}"#,
        unix(tmp.path())
    ));
    read_from_write(&mut session, &Settings::default());

    let out = tmp.path().join("scene_out.json");
    session.save(&out).unwrap();
    let reloaded = Session::load(&out).unwrap();
    let reader = reloaded.node("Read1").unwrap();
    assert_eq!(reader.knobs["first"], KnobValue::Int(7));
    assert_eq!(reader.knobs["last"], KnobValue::Int(9));
    assert!(reader.knobs["file"].as_str().unwrap().ends_with("/r/x.##.png"));
}
