//! Read-from-Write: create a Read node for every selected node with a file knob.
//!
//! One synchronous pass over the selection:
//!
//! ```text
//! Idle -> CollectingSelection -> ResolvingEachItem
//!      -> [AwaitingUserConfirmation] -> CreatingReaders -> Idle
//! ```
//!
//! Each (node, file knob) pair is processed on its own: a failure or a
//! declined prompt for one pair never affects the others. Readers are only
//! created once every pair has been resolved.

use log::{debug, info, warn};
use serde::Serialize;

use crate::config::Settings;
use crate::descriptor::describe;
use crate::error::{ReadError, Result};
use crate::format::format_path;
use crate::host::{Host, ItemId, KnobValue};
use crate::options::{NodeOptions, apply_options, collect_options};
use crate::range::{FrameRange, KNOB_FIRST, KNOB_LAST, RangeSource, fallback_range, metadata_range, resolve_range};
use crate::resolve::{PathOrigin, ResolvedPath, is_absolute, join_project, normalize_path, resolve};

/// File knob of the created reader
pub const READER_FILE_KNOB: &str = "file";

/// Orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    CollectingSelection,
    ResolvingEachItem,
    AwaitingUserConfirmation,
    CreatingReaders,
}

/// Everything needed to build one reader.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadInfo {
    pub path: String,
    pub range: FrameRange,
    pub range_source: RangeSource,
    pub options: NodeOptions,
}

/// `None` when the user declined to proceed without files on disk.
pub type ReadResult = Option<ReadInfo>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedReader {
    pub source: ItemId,
    pub knob: String,
    pub reader: ItemId,
    #[serde(flatten)]
    pub info: ReadInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedItem {
    pub source: ItemId,
    pub knob: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedItem {
    pub source: ItemId,
    pub knob: String,
    pub message: String,
}

/// Outcome of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub created: Vec<CreatedReader>,
    pub declined: Vec<SkippedItem>,
    pub failed: Vec<FailedItem>,
}

/// Read-from-Write driver over a host session.
pub struct ReadFromWrite<'a, H: Host + ?Sized> {
    host: &'a mut H,
    settings: &'a Settings,
    stage: Stage,
    trail: Vec<Stage>,
}

impl<'a, H: Host + ?Sized> ReadFromWrite<'a, H> {
    pub fn new(host: &'a mut H, settings: &'a Settings) -> Self {
        Self {
            host,
            settings,
            stage: Stage::Idle,
            trail: Vec::new(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Every stage entered so far, in order.
    pub fn trail(&self) -> &[Stage] {
        &self.trail
    }

    fn set_stage(&mut self, stage: Stage) {
        debug!("stage: {:?} -> {:?}", self.stage, stage);
        self.stage = stage;
        self.trail.push(stage);
    }

    /// Selected nodes exposing at least one configured file knob.
    pub fn eligible_items(&self) -> Vec<ItemId> {
        self.host
            .selected_items()
            .into_iter()
            .filter(|item| self.file_knobs(item).next().is_some())
            .collect()
    }

    fn file_knobs<'b>(&'b self, item: &'b str) -> impl Iterator<Item = &'b String> + 'b {
        self.settings
            .filepath_knobs
            .iter()
            .filter(move |k| self.host.has_knob(item, k))
    }

    /// Process the selection and create readers.
    pub fn run(&mut self) -> Report {
        let mut report = Report::default();

        self.set_stage(Stage::CollectingSelection);
        let items = self.eligible_items();
        if items.is_empty() {
            let message = format!(
                "Select a node with a file knob ({})",
                self.settings.filepath_knobs.join(", ")
            );
            warn!("{}", message);
            self.host.notify(&message);
            self.set_stage(Stage::Idle);
            return report;
        }

        self.set_stage(Stage::ResolvingEachItem);
        let mut pending: Vec<(ItemId, String, ReadInfo)> = Vec::new();
        for item in &items {
            let knobs: Vec<String> = self.file_knobs(item).cloned().collect();
            for knob in knobs {
                match self.gather(item, &knob) {
                    Ok(Some(info)) => pending.push((item.clone(), knob, info)),
                    Ok(None) => {
                        info!("{}.{}: declined, no reader created", item, knob);
                        report.declined.push(SkippedItem {
                            source: item.clone(),
                            knob,
                        });
                    }
                    Err(e) => {
                        let message = format!("{}.{}: {}", item, knob, e);
                        warn!("{}", message);
                        self.host.notify(&message);
                        report.failed.push(FailedItem {
                            source: item.clone(),
                            knob,
                            message: e.to_string(),
                        });
                    }
                }
                if self.stage != Stage::ResolvingEachItem {
                    self.set_stage(Stage::ResolvingEachItem);
                }
            }
        }

        self.set_stage(Stage::CreatingReaders);
        let mut per_source: Vec<&str> = Vec::new();
        for (item, knob, info) in &pending {
            let slot = per_source.iter().filter(|&&s| s == item.as_str()).count() as i64;
            per_source.push(item.as_str());
            let reader = self.create_reader(item, info, slot);
            report.created.push(CreatedReader {
                source: item.clone(),
                knob: knob.clone(),
                reader,
                info: info.clone(),
            });
        }

        self.set_stage(Stage::Idle);
        report
    }

    /// Resolve one (node, knob) pair. `Ok(None)` if the user declined.
    pub fn gather(&mut self, item: &str, knob: &str) -> Result<ReadResult> {
        let settings = self.settings;
        let formats = &settings.single_file_formats;
        let raw = self
            .host
            .knob(item, knob)
            .map(|v| v.to_string())
            .ok_or_else(|| ReadError::MissingKnob {
                item: item.to_string(),
                knob: knob.to_string(),
            })?;
        let evaluated = self.host.evaluate(item, knob).unwrap_or_else(|| raw.clone());
        if evaluated.trim().is_empty() {
            return Err(ReadError::PathNotFound(format!("{}.{} is empty", item, knob)));
        }
        let root = self.host.project_root();
        let options = collect_options(&*self.host, item, &settings.option_knobs);

        if let Some(resolved) = resolve(&raw, &evaluated, root.as_deref(), formats)? {
            let descriptor = describe(&resolved.path, formats)?;
            let (range, range_source) = resolve_range(&*self.host, item, &descriptor, &settings.reader_class)?;
            let path = format_path(&resolved, &descriptor, &raw, &evaluated, root.as_deref(), formats)?;
            debug!("{}.{}: {} -> {} [{}] from {:?}", item, knob, resolved.path, path, range, range_source);
            return Ok(Some(ReadInfo {
                path,
                range,
                range_source,
                options,
            }));
        }

        self.set_stage(Stage::AwaitingUserConfirmation);
        let (range, range_source) = match metadata_range(&*self.host, item, &settings.reader_class) {
            Some(range) => (range, RangeSource::Metadata),
            None => fallback_range(&*self.host, item),
        };
        let question = format!(
            "No files found on disk for {}.{}:\n{}\n\nCreate a Read node anyway with frame range {} ({:?})?",
            item, knob, evaluated, range, range_source
        );
        if !self.host.confirm(&question) {
            return Ok(None);
        }

        let resolved = guessed_path(&evaluated, root.as_deref());
        let descriptor = describe(&resolved.path, formats)?;
        let path = format_path(&resolved, &descriptor, &raw, &evaluated, root.as_deref(), formats)?;
        debug!("{}.{}: guessed {} [{}]", item, knob, path, range);
        Ok(Some(ReadInfo {
            path,
            range,
            range_source,
            options,
        }))
    }

    /// Create a reader below `source`. `slot` stacks several readers of one source.
    fn create_reader(&mut self, source: &str, info: &ReadInfo, slot: i64) -> ItemId {
        let reader = self.host.create_item(&self.settings.reader_class);

        self.host
            .set_knob(&reader, READER_FILE_KNOB, KnobValue::Str(info.path.clone()));
        self.host.set_knob(&reader, KNOB_FIRST, KnobValue::Int(info.range.first));
        self.host.set_knob(&reader, KNOB_LAST, KnobValue::Int(info.range.last));
        apply_options(&mut *self.host, &reader, &info.options);

        if let Some(pos) = self.host.position(source) {
            let step = pos.height + self.settings.reader_margin;
            self.host.set_position(&reader, pos.x, pos.y + step * (slot + 1));
        }

        info!("Created {} from {}: {} [{}]", reader, source, info.path, info.range);
        reader
    }
}

/// Where the files would be if they existed.
fn guessed_path(evaluated: &str, project_root: Option<&str>) -> ResolvedPath {
    match project_root {
        Some(root) if !root.trim().is_empty() && !is_absolute(evaluated) => ResolvedPath {
            path: normalize_path(&join_project(root, evaluated)),
            origin: PathOrigin::Combined {
                relative: evaluated.replace('\\', "/"),
            },
        },
        _ => ResolvedPath {
            path: normalize_path(evaluated),
            origin: PathOrigin::Evaluated,
        },
    }
}

/// Run Read-from-Write over the current selection.
pub fn read_from_write<H: Host + ?Sized>(host: &mut H, settings: &Settings) -> Report {
    ReadFromWrite::new(host, settings).run()
}
