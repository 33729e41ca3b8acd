// Inflectional paradigms.
//
// A paradigm is a list of slots, each a transducer from a stem to a form
// tagged with a feature string, plus the stems that inflect by it and the
// rules applied to every form. A paradigm may extend a parent: the parent's
// slots are copied in once, at construction, and a child slot with the
// same features replaces the parent's in place.

use fstkit_core::Semiring;
use fstkit_fst::{PathIterator, ProjectType, VectorFst, accep, compose, concat};

use crate::error::RewriteError;
use crate::utils::insert;

/// Separates a stem from its affixes in slot outputs.
pub const BOUNDARY: char = '+';

#[derive(Debug, Clone, PartialEq)]
pub struct Slot<W: Semiring> {
    pub features: String,
    pub transducer: VectorFst<W>,
}

impl<W: Semiring> Slot<W> {
    pub fn new(features: impl Into<String>, transducer: VectorFst<W>) -> Self {
        Slot {
            features: features.into(),
            transducer,
        }
    }
}

/// `stem` followed by an inserted `+suffix`.
pub fn suffix<W: Semiring>(suffix: &str, stem: &VectorFst<W>) -> VectorFst<W> {
    let affix = format!("{BOUNDARY}{suffix}");
    concat(stem, &insert(&accep(&affix, W::one())))
}

/// An inserted `prefix+` followed by `stem`.
pub fn prefix<W: Semiring>(prefix: &str, stem: &VectorFst<W>) -> VectorFst<W> {
    let affix = format!("{prefix}{BOUNDARY}");
    concat(&insert(&accep(&affix, W::one())), stem)
}

/// One row of [`Paradigm::table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormEntry {
    pub stem: String,
    pub features: String,
    pub forms: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Paradigm<W: Semiring> {
    name: String,
    slots: Vec<Slot<W>>,
    stems: Vec<String>,
    rules: Vec<VectorFst<W>>,
}

impl<W: Semiring> Paradigm<W> {
    pub fn new(name: impl Into<String>, slots: Vec<Slot<W>>, stems: Vec<String>) -> Self {
        Paradigm {
            name: name.into(),
            slots,
            stems,
            rules: Vec::new(),
        }
    }

    /// Rules applied, in order, to the output of every slot.
    pub fn with_rules(mut self, rules: Vec<VectorFst<W>>) -> Self {
        self.rules = rules;
        self
    }

    /// A paradigm inheriting `parent`'s slots and rules. Child slots
    /// override parent slots with equal features; new features are added
    /// after the inherited ones.
    pub fn extend(
        parent: &Paradigm<W>,
        name: impl Into<String>,
        slots: Vec<Slot<W>>,
        stems: Vec<String>,
    ) -> Self {
        let mut own: Vec<Option<Slot<W>>> = slots.into_iter().map(Some).collect();
        let mut flat = Vec::with_capacity(parent.slots.len() + own.len());
        for inherited in &parent.slots {
            let overriding = own
                .iter_mut()
                .find(|s| matches!(s, Some(slot) if slot.features == inherited.features));
            match overriding.and_then(Option::take) {
                Some(slot) => flat.push(slot),
                None => flat.push(inherited.clone()),
            }
        }
        flat.extend(own.into_iter().flatten());
        Paradigm {
            name: name.into(),
            slots: flat,
            stems,
            rules: parent.rules.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slots(&self) -> &[Slot<W>] {
        &self.slots
    }

    pub fn stems(&self) -> &[String] {
        &self.stems
    }

    pub fn rules(&self) -> &[VectorFst<W>] {
        &self.rules
    }

    fn realize(&self, stem: &str, slot: &Slot<W>) -> Result<Vec<String>, RewriteError> {
        let mut lattice = compose(&accep(stem, W::one()), &slot.transducer);
        for rule in &self.rules {
            lattice = compose(&lattice, rule);
        }
        lattice.project(ProjectType::Output);
        lattice.optimize();
        let mut forms = PathIterator::new(&lattice)?.ostrings()?;
        forms.sort();
        forms.dedup();
        Ok(forms)
    }

    /// Forms of `stem` for every slot, in slot order. A slot that does not
    /// accept the stem yields no forms.
    pub fn forms(&self, stem: &str) -> Result<Vec<(String, Vec<String>)>, RewriteError> {
        self.slots
            .iter()
            .map(|slot| {
                self.realize(stem, slot)
                    .map(|forms| (slot.features.clone(), forms))
            })
            .collect()
    }

    /// Every form of every stem.
    pub fn table(&self) -> Result<Vec<FormEntry>, RewriteError> {
        let mut rows = Vec::new();
        for stem in &self.stems {
            for (features, forms) in self.forms(stem)? {
                rows.push(FormEntry {
                    stem: stem.clone(),
                    features,
                    forms,
                });
            }
        }
        Ok(rows)
    }
}
