// Symbol table: bidirectional string <-> label mapping.

use crate::FstError;
use crate::label::{EPSILON, Label};
use hashbrown::HashMap;

/// Default name for label 0.
pub const EPSILON_SYMBOL: &str = "<eps>";

/// Bidirectional mapping between symbols and labels.
///
/// Label 0 is always epsilon. Symbols added without an explicit label get
/// the next label past the largest one seen so far.
///
/// Two serialized forms are supported:
/// - text: one `symbol<TAB>label` pair per line
/// - bytes: `count(u32 LE)` then `label(u32 LE) + null-terminated UTF-8` per entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    symbol_to_label: HashMap<String, Label>,
    label_to_symbol: HashMap<Label, String>,
    next_label: Label,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::with_epsilon_symbol(EPSILON_SYMBOL)
    }

    /// Table whose label 0 is spelled `epsilon`.
    pub fn with_epsilon_symbol(epsilon: &str) -> Self {
        let mut table = SymbolTable {
            symbol_to_label: HashMap::new(),
            label_to_symbol: HashMap::new(),
            next_label: 1,
        };
        table.insert(epsilon.to_string(), EPSILON);
        table
    }

    /// Table mapping every character to its code point label.
    pub fn from_chars(chars: impl IntoIterator<Item = char>) -> Self {
        let mut table = Self::new();
        for ch in chars {
            let mut buf = [0u8; 4];
            table.insert(ch.encode_utf8(&mut buf).to_string(), ch as Label);
        }
        table
    }

    fn insert(&mut self, symbol: String, label: Label) {
        if let Some(old) = self.label_to_symbol.insert(label, symbol.clone()) {
            self.symbol_to_label.remove(&old);
        }
        if let Some(old_label) = self.symbol_to_label.insert(symbol, label) {
            if old_label != label {
                self.label_to_symbol.remove(&old_label);
            }
        }
        if label >= self.next_label {
            self.next_label = label.saturating_add(1);
        }
    }

    /// Add `symbol` if absent and return its label.
    pub fn add_symbol(&mut self, symbol: &str) -> Label {
        if let Some(&label) = self.symbol_to_label.get(symbol) {
            return label;
        }
        let label = self.next_label;
        self.insert(symbol.to_string(), label);
        label
    }

    /// Bind `symbol` to `label`, replacing any previous binding of that label.
    pub fn add_symbol_with_label(&mut self, symbol: &str, label: Label) -> Label {
        self.insert(symbol.to_string(), label);
        label
    }

    pub fn find_label(&self, symbol: &str) -> Option<Label> {
        self.symbol_to_label.get(symbol).copied()
    }

    pub fn find_symbol(&self, label: Label) -> Option<&str> {
        self.label_to_symbol.get(&label).map(String::as_str)
    }

    pub fn contains_label(&self, label: Label) -> bool {
        self.label_to_symbol.contains_key(&label)
    }

    pub fn len(&self) -> usize {
        self.label_to_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.label_to_symbol.is_empty()
    }

    /// Entries in label order.
    pub fn iter(&self) -> impl Iterator<Item = (Label, &str)> {
        let mut entries: Vec<(Label, &str)> = self
            .label_to_symbol
            .iter()
            .map(|(&l, s)| (l, s.as_str()))
            .collect();
        entries.sort_unstable_by_key(|&(l, _)| l);
        entries.into_iter()
    }

    /// Parse `symbol<TAB>label` lines. Blank lines are skipped.
    pub fn parse_text(text: &str) -> Result<Self, FstError> {
        let mut table: Option<SymbolTable> = None;
        for (lineno, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split('\t');
            let (Some(symbol), Some(label), None) = (fields.next(), fields.next(), fields.next())
            else {
                return Err(FstError::InvalidSymbolTable(format!(
                    "line {}: expected two tab-separated fields",
                    lineno + 1
                )));
            };
            let label: Label = label.trim().parse().map_err(|_| {
                FstError::InvalidSymbolTable(format!("line {}: bad label {label:?}", lineno + 1))
            })?;
            match table.as_mut() {
                None if label == EPSILON => table = Some(Self::with_epsilon_symbol(symbol)),
                None => {
                    let mut t = Self::new();
                    t.add_symbol_with_label(symbol, label);
                    table = Some(t);
                }
                Some(t) => {
                    t.add_symbol_with_label(symbol, label);
                }
            }
        }
        Ok(table.unwrap_or_default())
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (label, symbol) in self.iter() {
            out.push_str(symbol);
            out.push('\t');
            out.push_str(&label.to_string());
            out.push('\n');
        }
        out
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(self.len() as u32).to_le_bytes());
        for (label, symbol) in self.iter() {
            buf.extend_from_slice(&label.to_le_bytes());
            buf.extend_from_slice(symbol.as_bytes());
            buf.push(0);
        }
        buf
    }

    /// Parse the byte encoding starting at `offset`. Returns the table and
    /// the offset just past it.
    pub fn from_bytes(data: &[u8], offset: usize) -> Result<(Self, usize), FstError> {
        let read_u32 = |pos: usize| -> Result<u32, FstError> {
            let bytes = data.get(pos..pos + 4).ok_or(FstError::TooShort {
                expected: pos + 4,
                actual: data.len(),
            })?;
            Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        };

        let count = read_u32(offset)?;
        let mut pos = offset + 4;
        let mut table = Self::new();
        for i in 0..count {
            let label = read_u32(pos)?;
            pos += 4;
            let str_start = pos;
            while pos < data.len() && data[pos] != 0 {
                pos += 1;
            }
            if pos >= data.len() {
                return Err(FstError::InvalidSymbolTable(
                    "unterminated symbol string".to_string(),
                ));
            }
            let symbol = std::str::from_utf8(&data[str_start..pos]).map_err(|_| {
                FstError::InvalidSymbolTable(format!("invalid UTF-8 in symbol {i}"))
            })?;
            pos += 1;
            table.add_symbol_with_label(symbol, label);
        }
        Ok((table, pos))
    }
}
