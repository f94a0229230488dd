use std::collections::BTreeMap;

use crate::model::structure::Structure;
use crate::model::types::Element;

/// Element → site-count multiset of one structure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composition {
    counts: BTreeMap<Element, usize>,
}

impl Composition {
    pub fn from_elements(elements: impl IntoIterator<Item = Element>) -> Self {
        let mut counts = BTreeMap::new();
        for element in elements {
            *counts.entry(element).or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn from_structure(structure: &Structure) -> Self {
        Self::from_elements(structure.symbols())
    }

    #[inline]
    pub fn count(&self, element: Element) -> usize {
        self.counts.get(&element).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Element, usize)> + '_ {
        self.counts.iter().map(|(&e, &c)| (e, c))
    }

    pub fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        self.counts.keys().copied()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total_sites(&self) -> usize {
        self.counts.values().sum()
    }

    /// Distinct element symbols in alphabetical order.
    pub fn sorted_symbols(&self) -> Vec<&'static str> {
        let mut symbols: Vec<_> = self.counts.keys().map(Element::symbol).collect();
        symbols.sort_unstable();
        symbols
    }

    /// Empirical formula in Hill order.
    ///
    /// Counts are reduced by their greatest common divisor. With carbon
    /// present the order is C, H, then the rest alphabetically; otherwise
    /// every symbol is alphabetical. Counts of one are omitted.
    pub fn empirical_formula(&self) -> String {
        let divisor = self.counts.values().copied().fold(0, gcd);
        if divisor == 0 {
            return String::new();
        }

        let has_carbon = self.counts.contains_key(&Element::C);
        let mut order: Vec<Element> = self.counts.keys().copied().collect();
        order.sort_by_key(|e| {
            let rank = match e {
                Element::C if has_carbon => 0,
                Element::H if has_carbon => 1,
                _ => 2,
            };
            (rank, e.symbol())
        });

        let mut formula = String::new();
        for element in order {
            let n = self.counts[&element] / divisor;
            formula.push_str(element.symbol());
            if n > 1 {
                formula.push_str(&n.to_string());
            }
        }
        formula
    }
}

impl FromIterator<Element> for Composition {
    fn from_iter<I: IntoIterator<Item = Element>>(iter: I) -> Self {
        Self::from_elements(iter)
    }
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 { a } else { gcd(b, a % b) }
}
