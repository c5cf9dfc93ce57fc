/// Plain chart data handed to the rendering layer.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartSeries {
    pub dataset_label: &'static str,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    pub fn new(dataset_label: &'static str) -> Self {
        Self {
            dataset_label,
            labels: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn push(&mut self, label: String, value: f64) {
        self.labels.push(label);
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// One row of a two-column table projection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableRow {
    pub label: String,
    pub value: String,
}
