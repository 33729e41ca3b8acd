// Binary serialization of `VectorFst`.
//
// Layout: header (16 bytes), counts record (16), one state record per
// state (8 each), padding to a 16-byte boundary, the arc table (16 per
// arc), then the optional symbol tables named by the header flags.
// Integers are little-endian.

use fstkit_core::{FstError, Semiring, SymbolTable};
use tracing::debug;

use crate::format::{FLAG_ISYMBOLS, FLAG_OSYMBOLS, FstHeader, HEADER_SIZE, parse_header};
use crate::fst::{Arc, VectorFst};
use crate::records::{ArcRecord, CountsRecord, NO_START, StateRecord, align_to, read_records};

const COUNTS_SIZE: usize = size_of::<CountsRecord>();

/// An automaton read from bytes, with the symbol tables stored alongside.
#[derive(Debug, Clone)]
pub struct LoadedFst<W: Semiring> {
    pub fst: VectorFst<W>,
    pub isymbols: Option<SymbolTable>,
    pub osymbols: Option<SymbolTable>,
}

impl<W: Semiring> VectorFst<W> {
    /// Serialize without symbol tables.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_bytes_with_symbols(None, None)
    }

    /// Serialize, appending the given symbol tables.
    pub fn to_bytes_with_symbols(
        &self,
        isymbols: Option<&SymbolTable>,
        osymbols: Option<&SymbolTable>,
    ) -> Vec<u8> {
        let mut flags = 0;
        if isymbols.is_some() {
            flags |= FLAG_ISYMBOLS;
        }
        if osymbols.is_some() {
            flags |= FLAG_OSYMBOLS;
        }
        let header = FstHeader {
            semiring: W::KIND,
            flags,
        };

        let mut data = Vec::with_capacity(
            HEADER_SIZE + COUNTS_SIZE + 8 * self.num_states() + 16 * (self.total_arcs() + 1),
        );
        data.extend_from_slice(&header.to_bytes());
        let counts = CountsRecord {
            num_states: self.num_states() as u32,
            num_arcs: self.total_arcs() as u32,
            start: if self.is_empty() {
                NO_START
            } else {
                self.start() as u32
            },
            _reserved: 0,
        };
        data.extend_from_slice(bytemuck::bytes_of(&counts));
        for s in self.states() {
            let record = StateRecord {
                final_weight: self.final_weight(s).value(),
                num_arcs: self.num_arcs(s) as u32,
            };
            data.extend_from_slice(bytemuck::bytes_of(&record));
        }
        data.resize(align_to(data.len(), size_of::<ArcRecord>()), 0);
        for s in self.states() {
            for arc in self.arcs(s) {
                let record = ArcRecord {
                    ilabel: arc.ilabel,
                    olabel: arc.olabel,
                    weight: arc.weight.value(),
                    nextstate: arc.nextstate as u32,
                };
                data.extend_from_slice(bytemuck::bytes_of(&record));
            }
        }
        if let Some(table) = isymbols {
            data.extend_from_slice(&table.to_bytes());
        }
        if let Some(table) = osymbols {
            data.extend_from_slice(&table.to_bytes());
        }
        data
    }

    /// Deserialize, ignoring any stored symbol tables.
    pub fn from_bytes(data: &[u8]) -> Result<Self, FstError> {
        Ok(read_fst(data)?.fst)
    }
}

/// Deserialize an automaton and its symbol tables.
///
/// Fails with `IncompatibleSemiring` if the stored semiring is not `W`'s,
/// `StateIndexOutOfRange` for a bad start state or arc destination, and
/// `InvalidWeight` for a weight outside the semiring domain.
pub fn read_fst<W: Semiring>(data: &[u8]) -> Result<LoadedFst<W>, FstError> {
    let header = parse_header(data)?;
    if header.semiring != W::KIND {
        return Err(FstError::IncompatibleSemiring {
            expected: W::KIND.name().to_string(),
            actual: header.semiring.name().to_string(),
        });
    }

    let counts = read_records::<CountsRecord>(data, HEADER_SIZE, 1)?[0];
    let num_states = counts.num_states as usize;
    let states = read_records::<StateRecord>(data, HEADER_SIZE + COUNTS_SIZE, num_states)?;
    let total: usize = states.iter().map(|s| s.num_arcs as usize).sum();
    let arc_offset = align_to(
        HEADER_SIZE + COUNTS_SIZE + num_states * size_of::<StateRecord>(),
        size_of::<ArcRecord>(),
    );
    if total != counts.num_arcs as usize {
        return Err(FstError::TooShort {
            expected: arc_offset + total.max(counts.num_arcs as usize) * size_of::<ArcRecord>(),
            actual: data.len(),
        });
    }
    let arcs = read_records::<ArcRecord>(data, arc_offset, total)?;

    let mut fst = VectorFst::new();
    fst.add_states(num_states);
    let mut next = arcs.iter();
    for (s, record) in states.iter().enumerate() {
        let fw = W::new(record.final_weight)?;
        if !fw.is_zero() {
            fst.put_final(s, fw);
        }
        fst.reserve_arcs(s, record.num_arcs as usize);
        for arc in next.by_ref().take(record.num_arcs as usize) {
            let dest = arc.nextstate as usize;
            if dest >= num_states {
                return Err(FstError::StateIndexOutOfRange {
                    state: dest,
                    num_states,
                });
            }
            fst.push_arc(s, Arc::new(arc.ilabel, arc.olabel, W::new(arc.weight)?, dest));
        }
    }
    if counts.start != NO_START {
        fst.set_start(counts.start as usize)?;
    }

    let mut pos = arc_offset + total * size_of::<ArcRecord>();
    let mut read_table = |flag: u8| -> Result<Option<SymbolTable>, FstError> {
        if header.flags & flag == 0 {
            return Ok(None);
        }
        let (table, end) = SymbolTable::from_bytes(data, pos)?;
        pos = end;
        Ok(Some(table))
    };
    let isymbols = read_table(FLAG_ISYMBOLS)?;
    let osymbols = read_table(FLAG_OSYMBOLS)?;
    debug!(states = num_states, arcs = total, "loaded automaton");
    Ok(LoadedFst {
        fst,
        isymbols,
        osymbols,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::cross_strings;
    use crate::rational::union;
    use fstkit_core::{LogWeight, TropicalWeight};

    type W = TropicalWeight;

    fn sample() -> VectorFst<W> {
        union(
            &cross_strings("ab", "x", W::from(1.5)),
            &cross_strings("c", "yz", W::from(-0.5)),
        )
    }

    #[test]
    fn round_trip() {
        let fst = sample();
        let data = fst.to_bytes();
        assert_eq!(data.len() % 16, 0);
        let back = VectorFst::<W>::from_bytes(&data).unwrap();
        assert_eq!(back, fst);
        assert!(back.verify());
    }

    #[test]
    fn empty_round_trip() {
        let fst = VectorFst::<W>::new();
        let back = VectorFst::<W>::from_bytes(&fst.to_bytes()).unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn symbol_tables_travel_along() {
        let isyms = SymbolTable::from_chars("abc".chars());
        let osyms = SymbolTable::from_chars("xyz".chars());
        let data = sample().to_bytes_with_symbols(Some(&isyms), Some(&osyms));
        let loaded = read_fst::<W>(&data).unwrap();
        assert_eq!(loaded.fst, sample());
        assert_eq!(loaded.isymbols.unwrap().find_label("b"), Some('b' as u32));
        assert_eq!(loaded.osymbols.unwrap().find_symbol('z' as u32), Some("z"));
    }

    #[test]
    fn wrong_semiring() {
        let data = sample().to_bytes();
        let err = VectorFst::<LogWeight>::from_bytes(&data).unwrap_err();
        assert_eq!(
            err,
            FstError::IncompatibleSemiring {
                expected: "log".to_string(),
                actual: "tropical".to_string(),
            }
        );
    }

    #[test]
    fn truncated_arc_table() {
        let data = sample().to_bytes();
        let err = VectorFst::<W>::from_bytes(&data[..data.len() - 8]).unwrap_err();
        assert!(matches!(err, FstError::TooShort { .. }));
    }

    #[test]
    fn bad_destination() {
        let fst = cross_strings::<W>("a", "b", W::one());
        let mut data = fst.to_bytes();
        // nextstate of the only arc is the last word of the file
        let n = data.len();
        data[n - 4..].copy_from_slice(&7u32.to_le_bytes());
        assert_eq!(
            VectorFst::<W>::from_bytes(&data).unwrap_err(),
            FstError::StateIndexOutOfRange {
                state: 7,
                num_states: 2
            }
        );
    }

    #[test]
    fn invalid_weight() {
        let fst = cross_strings::<W>("a", "b", W::one());
        let mut data = fst.to_bytes();
        let n = data.len();
        data[n - 8..n - 4].copy_from_slice(&f32::NAN.to_le_bytes());
        assert!(matches!(
            VectorFst::<W>::from_bytes(&data),
            Err(FstError::InvalidWeight(_))
        ));
    }
}
