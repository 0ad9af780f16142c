// src/coverage/accumulator.rs

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Raw per-line data collected by a driver for one run.
///
/// Hit counts follow the usual driver convention: `> 0` executed,
/// `0` or `-1` executable but not executed, `-2` dead code.
pub type RawCoverage = BTreeMap<PathBuf, BTreeMap<u32, i32>>;

/// Lines per file, used to restrict what `stop` records.
pub type LineSet = BTreeMap<PathBuf, BTreeSet<u32>>;

/// Measures which lines run while a test id is active.
pub trait CoverageDriver {
    fn start(&mut self);
    fn stop(&mut self) -> RawCoverage;
}

/// Driver that measures nothing. Plugins that collect coverage out of
/// process feed it through [`Accumulator::append`] instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDriver;

impl CoverageDriver for NullDriver {
    fn start(&mut self) {}

    fn stop(&mut self) -> RawCoverage {
        RawCoverage::new()
    }
}

/// Per-file, per-line set of test ids that executed the line.
///
/// An executable line that nothing covered is present with an empty set.
/// Merging is a set union, so merging the same data twice changes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accumulator {
    files: BTreeMap<PathBuf, BTreeMap<u32, BTreeSet<String>>>,
    tests: BTreeSet<String>,
}

/// Covered / executable line counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineTotals {
    pub executable: usize,
    pub covered: usize,
}

impl LineTotals {
    pub fn percent(&self) -> f64 {
        if self.executable == 0 {
            return 100.0;
        }
        self.covered as f64 * 100.0 / self.executable as f64
    }

    fn add(&mut self, other: LineTotals) {
        self.executable += other.executable;
        self.covered += other.covered;
    }
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files(&self) -> impl Iterator<Item = (&Path, &BTreeMap<u32, BTreeSet<String>>)> {
        self.files.iter().map(|(p, lines)| (p.as_path(), lines))
    }

    pub fn tests(&self) -> &BTreeSet<String> {
        &self.tests
    }

    /// Test ids that executed `line` of `file`.
    pub fn covering(&self, file: &Path, line: u32) -> Option<&BTreeSet<String>> {
        self.files.get(file).and_then(|lines| lines.get(&line))
    }

    /// Record one run's data under `id`.
    ///
    /// With `append == false`, whatever `id` covered before is dropped first.
    pub fn append(&mut self, id: &str, data: RawCoverage, append: bool) {
        if !append {
            self.clear_test(id);
        }
        self.tests.insert(id.to_string());

        for (file, lines) in data {
            let entry = self.files.entry(file).or_default();
            for (line, hits) in lines {
                if hits == -2 {
                    continue;
                }
                let ids = entry.entry(line).or_default();
                if hits > 0 {
                    ids.insert(id.to_string());
                }
            }
        }
    }

    /// Forget everything attributed to `id`. Executable lines stay known.
    pub fn clear_test(&mut self, id: &str) {
        if !self.tests.remove(id) {
            return;
        }
        for lines in self.files.values_mut() {
            for ids in lines.values_mut() {
                ids.remove(id);
            }
        }
    }

    pub fn merge(&mut self, other: &Accumulator) {
        self.tests.extend(other.tests.iter().cloned());
        for (file, lines) in &other.files {
            let entry = self.files.entry(file.clone()).or_default();
            for (line, ids) in lines {
                entry.entry(*line).or_default().extend(ids.iter().cloned());
            }
        }
    }

    /// Keep only the files `keep` accepts.
    pub fn retain_files(&mut self, mut keep: impl FnMut(&Path) -> bool) {
        self.files.retain(|p, _| keep(p));
    }

    pub fn file_totals(&self, file: &Path) -> LineTotals {
        self.files
            .get(file)
            .map(|lines| LineTotals {
                executable: lines.len(),
                covered: lines.values().filter(|ids| !ids.is_empty()).count(),
            })
            .unwrap_or_default()
    }

    pub fn totals(&self) -> LineTotals {
        let mut totals = LineTotals::default();
        for file in self.files.keys() {
            totals.add(self.file_totals(file));
        }
        totals
    }
}

/// Keep only lines present in `covered ∪ used`.
pub(crate) fn restrict(data: RawCoverage, covered: &LineSet, used: &LineSet) -> RawCoverage {
    data.into_iter()
        .filter_map(|(file, lines)| {
            let allowed: BTreeSet<u32> = covered
                .get(&file)
                .into_iter()
                .chain(used.get(&file))
                .flatten()
                .copied()
                .collect();
            let lines: BTreeMap<u32, i32> = lines
                .into_iter()
                .filter(|(line, _)| allowed.contains(line))
                .collect();
            (!lines.is_empty()).then_some((file, lines))
        })
        .collect()
}
