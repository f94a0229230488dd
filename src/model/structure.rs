use super::types::Element;

#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub element: Element,
    pub position: [f64; 3],
}

impl Site {
    pub fn new(element: Element, position: [f64; 3]) -> Self {
        Self { element, position }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Structure {
    pub sites: Vec<Site>,
    pub cell: [[f64; 3]; 3],
    pub pbc: [bool; 3],
}

impl Structure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a non-periodic structure from `(element, position)` pairs.
    pub fn from_sites(sites: impl IntoIterator<Item = (Element, [f64; 3])>) -> Self {
        Self {
            sites: sites
                .into_iter()
                .map(|(element, position)| Site::new(element, position))
                .collect(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn symbols(&self) -> impl Iterator<Item = Element> + '_ {
        self.sites.iter().map(|s| s.element)
    }

    #[inline]
    pub fn is_periodic(&self) -> bool {
        self.pbc.iter().any(|&p| p)
    }

    pub fn has_cell(&self) -> bool {
        self.cell.iter().flatten().any(|&v| v != 0.0)
    }
}
