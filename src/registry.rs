/*! Talk-group directory.

The gateway ships with a line-delimited text file of reachable talk
groups, one record per line:

```text
# id;option;name;description
0000009;0;LOCAL           ;LOCAL MODULE
1234567;0;EXAMPLE NET     ;WIDE AREA
```

Records are normalised at ingest so the WiresX reply builders can copy
them straight into their fixed-width fields: ids are 7 decimal digits,
names 16 characters, descriptions 14. Load order is preserved because
the directory pages the radio sees are windows into it.
 */
use std::io::BufRead;
use std::path::Path;

use log::warn;

use crate::Result;

const NAME_LEN: usize = 16;
const DESC_LEN: usize = 14;

fn pad(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width).collect();
    while out.chars().count() < width {
        out.push(' ');
    }
    out
}

/// One talk-group directory record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TalkGroup {
    id: String,
    opt: String,
    name: String,
    desc: String,
}

impl TalkGroup {
    fn new(id: u32, opt: &str, name: &str, desc: &str, fold_case: bool) -> Self {
        let (name, desc) = if fold_case {
            (name.to_uppercase(), desc.to_uppercase())
        } else {
            (name.to_string(), desc.to_string())
        };
        Self {
            id: format!("{id:07}"),
            opt: opt.to_string(),
            name: pad(&name, NAME_LEN),
            desc: pad(&desc, DESC_LEN),
        }
    }

    /// Talk-group id, always 7 decimal digits.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The free-form option field, decoded as a number on demand.
    #[must_use]
    pub fn opt(&self) -> Option<u32> {
        self.opt.parse().ok()
    }

    /// Display name, always 16 characters.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description, always 14 characters.
    #[must_use]
    pub fn desc(&self) -> &str {
        &self.desc
    }
}

/// An ordered talk-group directory.
#[derive(Debug, Default)]
pub struct Registry {
    groups: Vec<TalkGroup>,
    fold_case: bool,
}

impl Registry {
    /// Create an empty registry. With `fold_case` set, names and
    /// descriptions are upper-cased at ingest; ids never are.
    #[must_use]
    pub fn new(fold_case: bool) -> Self {
        Self {
            groups: Vec::new(),
            fold_case,
        }
    }

    /// Load a registry from a file.
    pub fn from_file<P: AsRef<Path>>(path: P, fold_case: bool) -> Result<Self> {
        let mut registry = Self::new(fold_case);
        let file = std::fs::File::open(path)?;
        registry.load(std::io::BufReader::new(file))?;
        Ok(registry)
    }

    /// Append records from a reader, returning how many were added.
    ///
    /// Blank lines and `#` comments are skipped. A data line has at
    /// least four `;` separated fields, trimmed of surrounding
    /// whitespace; extra fields are ignored. Lines that cannot be
    /// parsed are skipped with a warning rather than failing the
    /// whole load.
    pub fn load<R: BufRead>(&mut self, reader: R) -> Result<usize> {
        let mut added = 0;
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split(';').map(str::trim).collect();
            if fields.len() < 4 {
                warn!("talk group line {}: expected 4 fields, skipping", n + 1);
                continue;
            }
            let Ok(id) = fields[0].parse::<u32>() else {
                warn!("talk group line {}: bad id {:?}, skipping", n + 1, fields[0]);
                continue;
            };
            self.groups
                .push(TalkGroup::new(id, fields[1], fields[2], fields[3], self.fold_case));
            added += 1;
        }
        Ok(added)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True when no records are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// First record matching a numeric id.
    #[must_use]
    pub fn find_by_id(&self, id: u32) -> Option<&TalkGroup> {
        let id = format!("{id:07}");
        self.groups.iter().find(|g| g.id == id)
    }

    /// All records whose trimmed name starts with the trimmed,
    /// case-insensitive query, sorted by trimmed name.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<&TalkGroup> {
        let term = term.trim().to_uppercase();
        let mut hits: Vec<&TalkGroup> = self
            .groups
            .iter()
            .filter(|g| g.name.trim().to_uppercase().starts_with(&term))
            .collect();
        hits.sort_by(|a, b| a.name.trim().cmp(b.name.trim()));
        hits
    }

    /// A window of up to `count` records in load order, empty when
    /// `start` is past the end.
    #[must_use]
    pub fn get_all(&self, start: usize, count: usize) -> &[TalkGroup] {
        let lo = start.min(self.groups.len());
        let hi = (start + count).min(self.groups.len());
        &self.groups[lo..hi]
    }
}
