use serde::Serialize;
use stabsim_core::SignalKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalColumn {
    pub key: String,
    pub values: Vec<f64>,
}

/// Time-indexed table of one signal type.
///
/// Columns are ordered by key. A table that received no channels is the canonical empty table
/// (no time vector, no columns), which means "signal not recorded" and is not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalTable {
    kind: SignalKind,
    time: Vec<f64>,
    columns: Vec<SignalColumn>,
}

impl SignalTable {
    pub fn empty(kind: SignalKind) -> Self {
        Self {
            kind,
            time: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn kind(&self) -> SignalKind {
        self.kind
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn columns(&self) -> &[SignalColumn] {
        &self.columns
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.key.as_str())
    }

    /// First column stored under `key`.
    pub fn column(&self, key: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|column| column.key == key)
            .map(|column| column.values.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.time.len()
    }

    /// Smallest and largest finite sample across all columns.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.columns
            .iter()
            .flat_map(|column| column.values.iter().copied())
            .filter(|value| value.is_finite())
            .fold(None, |range, value| match range {
                None => Some((value, value)),
                Some((lo, hi)) => Some((lo.min(value), hi.max(value))),
            })
    }

    /// Adds a column. Repeated keys are kept as additional columns.
    pub(crate) fn push_column(&mut self, time: &[f64], key: String, values: Vec<f64>) {
        if self.columns.is_empty() {
            self.time = time.to_vec();
        }
        self.columns.push(SignalColumn { key, values });
    }

    /// Orders columns by key. The sort is stable, so repeated keys keep arrival order.
    pub(crate) fn sort_columns(&mut self) {
        self.columns.sort_by(|a, b| a.key.cmp(&b.key));
    }
}

/// The four tables one run reduces to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalSet {
    pub power: SignalTable,
    pub frequency: SignalTable,
    pub voltage: SignalTable,
    pub speed: SignalTable,
}

impl Default for SignalSet {
    fn default() -> Self {
        Self {
            power: SignalTable::empty(SignalKind::Power),
            frequency: SignalTable::empty(SignalKind::Frequency),
            voltage: SignalTable::empty(SignalKind::Voltage),
            speed: SignalTable::empty(SignalKind::Speed),
        }
    }
}

impl SignalSet {
    pub fn get(&self, kind: SignalKind) -> &SignalTable {
        match kind {
            SignalKind::Power => &self.power,
            SignalKind::Frequency => &self.frequency,
            SignalKind::Voltage => &self.voltage,
            SignalKind::Speed => &self.speed,
        }
    }

    pub(crate) fn get_mut(&mut self, kind: SignalKind) -> &mut SignalTable {
        match kind {
            SignalKind::Power => &mut self.power,
            SignalKind::Frequency => &mut self.frequency,
            SignalKind::Voltage => &mut self.voltage,
            SignalKind::Speed => &mut self.speed,
        }
    }

    /// Tables in power, frequency, voltage, speed order.
    pub fn iter(&self) -> impl Iterator<Item = &SignalTable> {
        SignalKind::ALL.into_iter().map(move |kind| self.get(kind))
    }

    pub fn non_empty(&self) -> impl Iterator<Item = &SignalTable> {
        self.iter().filter(|table| !table.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.iter().all(SignalTable::is_empty)
    }
}
