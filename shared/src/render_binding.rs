//! Signal index → CSS custom property binding.
//!
//! Every single-bit signal gets a render variable (`--sig-<escaped name>`).
//! Sheet assets colour their wires with `var(--sig-...)`, so a refresh only
//! writes one property per signal on the document root.

use std::fmt::Write as _;

use indexmap::IndexMap;

use crate::config::ColorsSection;
use crate::simulator::{SignalInfo, Simulator, SimulatorError};

const VARIABLE_PREFIX: &str = "--sig-";

/// Root style scope of the active schematic document.
pub trait StyleScope {
    fn set_property(&mut self, name: &str, value: &str);
    /// Removes every property set on the scope.
    fn clear_all(&mut self);
}

/// Render variable name for a signal. Injective over all names.
pub fn render_variable_name(signal: &str) -> String {
    let mut name = String::with_capacity(VARIABLE_PREFIX.len() + signal.len());
    name.push_str(VARIABLE_PREFIX);
    for byte in signal.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            name.push(byte as char);
        } else {
            let _ = write!(name, "_{byte:02x}");
        }
    }
    name
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalPalette {
    pub low: String,
    pub high: String,
    pub highlight: String,
}

impl SignalPalette {
    pub fn from_colors(colors: &ColorsSection) -> Self {
        Self {
            low: colors.signal_low.clone(),
            high: colors.signal_high.clone(),
            highlight: colors.highlight.clone(),
        }
    }

    fn for_level(&self, high: bool) -> &str {
        if high { &self.high } else { &self.low }
    }
}

impl Default for SignalPalette {
    fn default() -> Self {
        Self::from_colors(&ColorsSection::default())
    }
}

#[derive(Debug, Clone)]
pub struct SignalRenderBinding {
    count: usize,
    // one table per signal domain, indexed by the signal's start index
    tables: IndexMap<Option<u32>, Vec<Option<String>>>,
    palette: SignalPalette,
    hovered: Option<String>,
}

impl SignalRenderBinding {
    pub fn build(simulator: &impl Simulator, palette: SignalPalette) -> Result<Self, SimulatorError> {
        Ok(Self::from_info(&simulator.signal_info()?, palette))
    }

    pub fn from_info(info: &SignalInfo, palette: SignalPalette) -> Self {
        let mut tables: IndexMap<Option<u32>, Vec<Option<String>>> = IndexMap::new();
        for (name, entry) in &info.names {
            if entry.count != 1 {
                continue;
            }
            if entry.start >= info.count {
                log::warn!(
                    "signal '{name}' at index {} is outside the reported count {}",
                    entry.start,
                    info.count
                );
                continue;
            }
            let table = tables
                .entry(entry.domain)
                .or_insert_with(|| vec![None; info.count]);
            table[entry.start] = Some(render_variable_name(name));
        }
        let binding = Self {
            count: info.count,
            tables,
            palette,
            hovered: None,
        };
        log::debug!(
            "bound {} of {} signals to render variables in {} domain(s)",
            binding.bound_count(),
            binding.len(),
            binding.tables.len()
        );
        binding
    }

    /// Reported signal count; every domain table has this length.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn bound_count(&self) -> usize {
        self.tables.values().flatten().flatten().count()
    }

    pub fn domains(&self) -> impl Iterator<Item = Option<u32>> + '_ {
        self.tables.keys().copied()
    }

    pub fn variable(&self, domain: Option<u32>, index: usize) -> Option<&str> {
        self.tables
            .get(&domain)
            .and_then(|table| table.get(index))
            .and_then(Option::as_deref)
    }

    pub fn palette(&self) -> &SignalPalette {
        &self.palette
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Writes the value colour of every bound signal. Without an active
    /// document there is nothing to paint.
    pub fn refresh<S: StyleScope>(
        &self,
        simulator: &impl Simulator,
        styles: Option<&mut S>,
    ) -> Result<(), SimulatorError> {
        let Some(styles) = styles else {
            return Ok(());
        };
        for (domain, table) in &self.tables {
            let data = simulator.signal_data(*domain)?;
            for (index, variable) in table.iter().enumerate() {
                let Some(variable) = variable else { continue };
                let Some(level) = data.get(index) else { break };
                styles.set_property(variable, self.palette.for_level(*level != 0));
            }
        }
        if let Some(hovered) = &self.hovered {
            styles.set_property(hovered, &self.palette.highlight);
        }
        Ok(())
    }

    /// Forces the highlight colour onto a signal until [`Self::unhover`].
    pub fn hover<S: StyleScope>(&mut self, signal: &str, styles: Option<&mut S>) {
        let variable = render_variable_name(signal);
        if let Some(styles) = styles {
            styles.set_property(&variable, &self.palette.highlight);
        }
        self.hovered = Some(variable);
    }

    /// Clears every override on the scope, not just the highlight.
    pub fn unhover<S: StyleScope>(&mut self, styles: Option<&mut S>) {
        self.hovered = None;
        if let Some(styles) = styles {
            styles.clear_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::SignalEntry;
    use crate::testing::{FakeSimulator, RecordingStyles};

    fn three_plus_bus() -> FakeSimulator {
        FakeSimulator::with_signals(&[("A", 0, 1), ("B", 1, 1), ("C", 2, 1), ("BUS", 3, 2)], 5)
    }

    #[test]
    fn only_single_bit_signals_are_bound() {
        let binding = SignalRenderBinding::build(&three_plus_bus(), SignalPalette::default()).unwrap();
        assert_eq!(binding.len(), 5);
        assert_eq!(binding.bound_count(), 3);
        assert_eq!(binding.variable(None, 0), Some("--sig-A"));
        assert_eq!(binding.variable(None, 1), Some("--sig-B"));
        assert_eq!(binding.variable(None, 2), Some("--sig-C"));
        assert_eq!(binding.variable(None, 3), None);
        assert_eq!(binding.variable(None, 4), None);
    }

    #[test]
    fn variable_names_escape_reserved_bytes() {
        assert_eq!(render_variable_name("CLK1"), "--sig-CLK1");
        assert_eq!(render_variable_name("/RESET"), "--sig-_2fRESET");
        assert_eq!(render_variable_name("A_B"), "--sig-A_5fB");
        assert_eq!(render_variable_name("a-b"), "--sig-a-b");
        // literal "_5f" cannot collide with an escaped underscore
        assert_ne!(render_variable_name("A_5fB"), render_variable_name("A_B"));
    }

    #[test]
    fn refresh_paints_value_colours() {
        let mut simulator = three_plus_bus();
        simulator.signal_values = vec![1, 0, 1, 1, 1];
        let palette = SignalPalette::default();
        let binding = SignalRenderBinding::build(&simulator, palette.clone()).unwrap();
        let mut styles = RecordingStyles::default();
        binding.refresh(&simulator, Some(&mut styles)).unwrap();
        assert_eq!(styles.get("--sig-A"), Some(palette.high.as_str()));
        assert_eq!(styles.get("--sig-B"), Some(palette.low.as_str()));
        assert_eq!(styles.get("--sig-C"), Some(palette.high.as_str()));
        assert_eq!(styles.properties.len(), 3);
    }

    #[test]
    fn refresh_without_document_queries_nothing() {
        let simulator = three_plus_bus();
        let binding = SignalRenderBinding::build(&simulator, SignalPalette::default()).unwrap();
        binding.refresh::<RecordingStyles>(&simulator, None).unwrap();
        assert_eq!(simulator.signal_data_reads.get(), 0);
    }

    #[test]
    fn hover_wins_over_refresh_until_unhover_clears_everything() {
        let mut simulator = three_plus_bus();
        simulator.signal_values = vec![0, 0, 0, 0, 0];
        let palette = SignalPalette::default();
        let mut binding = SignalRenderBinding::build(&simulator, palette.clone()).unwrap();
        let mut styles = RecordingStyles::default();

        binding.hover("B", Some(&mut styles));
        assert_eq!(styles.get("--sig-B"), Some(palette.highlight.as_str()));
        binding.refresh(&simulator, Some(&mut styles)).unwrap();
        assert_eq!(styles.get("--sig-B"), Some(palette.highlight.as_str()));

        binding.unhover(Some(&mut styles));
        assert!(styles.properties.is_empty());
        assert_eq!(styles.clears, 1);
    }

    #[test]
    fn domains_keep_separate_tables_and_value_arrays() {
        let entry = |domain, start| SignalEntry {
            domain: Some(domain),
            start,
            count: 1,
        };
        let mut simulator = FakeSimulator::default();
        simulator.signal_info = SignalInfo {
            count: 2,
            names: [
                ("A".to_string(), entry(0, 0)),
                ("B".to_string(), entry(1, 0)),
                ("C".to_string(), entry(1, 1)),
            ]
            .into_iter()
            .collect(),
        };
        simulator.domain_values.insert(0, vec![1, 0]);
        simulator.domain_values.insert(1, vec![0, 1]);

        let palette = SignalPalette::default();
        let binding = SignalRenderBinding::build(&simulator, palette.clone()).unwrap();
        assert_eq!(binding.len(), 2);
        assert_eq!(binding.bound_count(), 3);
        assert_eq!(binding.domains().collect::<Vec<_>>(), [Some(0), Some(1)]);
        assert_eq!(binding.variable(Some(0), 0), Some("--sig-A"));
        assert_eq!(binding.variable(Some(1), 0), Some("--sig-B"));
        assert_eq!(binding.variable(Some(1), 1), Some("--sig-C"));
        assert_eq!(binding.variable(Some(0), 1), None);

        let mut styles = RecordingStyles::default();
        binding.refresh(&simulator, Some(&mut styles)).unwrap();
        assert_eq!(simulator.signal_data_reads.get(), 2);
        assert_eq!(styles.get("--sig-A"), Some(palette.high.as_str()));
        assert_eq!(styles.get("--sig-B"), Some(palette.low.as_str()));
        assert_eq!(styles.get("--sig-C"), Some(palette.high.as_str()));
    }
}
