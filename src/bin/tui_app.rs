use serde::Deserialize;

// ---------------------------------------------------------------------------
// API response types (mirror routes.rs shapes)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub target_cpa: f64,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct MetricsView {
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub struct DerivedView {
    pub ctr: f64,
    pub cr: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimelineEntryView {
    pub at_ns: u64,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SnapshotResponse {
    pub products: Vec<ProductView>,
    pub metrics: MetricsView,
    pub derived: DerivedView,
    pub timeline: Vec<TimelineEntryView>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[allow(dead_code)]
pub struct HealthResponse {
    pub sim_ticks: u64,
    pub last_tick_at_ns: u64,
    pub products_tracked: usize,
    pub timeline_len: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThemeResponse {
    pub theme: String,
}

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connected,
    Error(String),
    Connecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn from_name(name: &str) -> Self {
        if name == "light" {
            Theme::Light
        } else {
            Theme::Dark
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Dashboard,
    Products,
}

pub const FORM_LABELS: [&str; 4] = ["Name", "Category", "Price", "Target CPA"];

/// Add-product modal state. Fields hold the raw strings exactly as typed;
/// the service does all parsing and validation.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub fields: [String; 4],
    pub focus: usize,
    pub error: Option<String>,
}

impl ProductForm {
    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    pub fn prev_field(&mut self) {
        self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }

    pub fn push_char(&mut self, c: char) {
        self.fields[self.focus].push(c);
    }

    pub fn backspace(&mut self) {
        self.fields[self.focus].pop();
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub status: ConnectionStatus,
    pub snapshot: SnapshotResponse,
    pub health: HealthResponse,
    pub theme: Theme,
    pub pane: Pane,
    pub form: Option<ProductForm>,
    pub last_refresh: std::time::Instant,
    pub base_url: String,
}

impl AppState {
    pub fn new(base_url: String) -> Self {
        Self {
            status: ConnectionStatus::Connecting,
            snapshot: SnapshotResponse::default(),
            health: HealthResponse::default(),
            theme: Theme::Dark,
            pane: Pane::Dashboard,
            form: None,
            last_refresh: std::time::Instant::now(),
            base_url,
        }
    }

    /// Fetch the saved theme once at startup. A miss keeps the default.
    pub async fn load_theme(&mut self, client: &reqwest::Client) {
        let url = format!("{}/theme", self.base_url);
        if let Ok(resp) = client.get(&url).send().await {
            if let Ok(t) = resp.json::<ThemeResponse>().await {
                self.theme = Theme::from_name(&t.theme);
            }
        }
    }

    pub async fn refresh(&mut self, client: &reqwest::Client) {
        let snapshot_url = format!("{}/snapshot", self.base_url);
        let health_url = format!("{}/health", self.base_url);

        let (snapshot_res, health_res) = tokio::join!(
            client.get(&snapshot_url).send(),
            client.get(&health_url).send(),
        );

        let snapshot_resp = match snapshot_res {
            Ok(resp) => resp,
            Err(e) => {
                self.status = ConnectionStatus::Error(format!("{e}"));
                return;
            }
        };

        match snapshot_resp.json::<SnapshotResponse>().await {
            Ok(snap) => {
                self.snapshot = snap;
                self.status = ConnectionStatus::Connected;
                self.last_refresh = std::time::Instant::now();

                if let Ok(h) = health_res {
                    if let Ok(health) = h.json::<HealthResponse>().await {
                        self.health = health;
                    }
                }
            }
            Err(e) => {
                self.status = ConnectionStatus::Error(format!("parse error: {e}"));
            }
        }
    }

    /// Flip the palette and persist the choice. The local theme only
    /// changes once the service confirms the write.
    pub async fn toggle_theme(&mut self, client: &reqwest::Client) {
        let next = self.theme.toggled();
        let url = format!("{}/theme", self.base_url);
        let body = serde_json::json!({ "theme": next.as_str() });

        match client.put(&url).json(&body).send().await {
            Ok(resp) if resp.status().is_success() => self.theme = next,
            Ok(resp) => {
                self.status =
                    ConnectionStatus::Error(format!("theme not saved: HTTP {}", resp.status()));
            }
            Err(e) => self.status = ConnectionStatus::Error(format!("{e}")),
        }
    }

    /// Submit the add-product form as raw field strings. A rejection is
    /// shown inside the modal; the form closes only on success.
    pub async fn submit_form(&mut self, client: &reqwest::Client) {
        let Some(form) = self.form.as_ref() else {
            return;
        };
        let fields = form.fields.clone();
        let body = serde_json::json!({
            "name": fields[0],
            "category": fields[1],
            "price": fields[2],
            "target_cpa": fields[3],
        });
        let url = format!("{}/products", self.base_url);

        let outcome = match client.post(&url).json(&body).send().await {
            Ok(resp) if resp.status().is_success() => Ok(()),
            Ok(resp) => Err(resp
                .text()
                .await
                .unwrap_or_else(|_| "request rejected".to_string())),
            Err(e) => Err(format!("{e}")),
        };

        match outcome {
            Ok(()) => {
                self.form = None;
                self.refresh(client).await;
            }
            Err(msg) => {
                if let Some(form) = self.form.as_mut() {
                    form.error = Some(msg);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Thousands-separated integer, e.g. 1234567 → "1,234,567".
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Currency with two decimals and grouping, e.g. 4349.495 → "$4,349.50".
pub fn format_currency(v: f64) -> String {
    let cents = (v.max(0.0) * 100.0).round() as u64;
    format!("${}.{:02}", format_count(cents / 100), cents % 100)
}

/// Rate in [0,1] as a percentage with one decimal, e.g. 0.175 → "17.5%".
pub fn format_percent(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}

/// Convert nanosecond epoch timestamp to HH:MM:SS string.
pub fn format_time_ns(ns: u64) -> String {
    let secs = ns / 1_000_000_000;
    let h = (secs / 3600) % 24;
    let m = (secs / 60) % 60;
    let s = secs % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}…", &s[..max.saturating_sub(1)])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_grouping() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1200), "1,200");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn currency_rounds_to_cents() {
        assert_eq!(format_currency(4200.0), "$4,200.00");
        assert_eq!(format_currency(4349.495), "$4,349.50");
        assert_eq!(format_currency(0.0), "$0.00");
    }

    #[test]
    fn percent_one_decimal() {
        assert_eq!(format_percent(0.175), "17.5%");
        assert_eq!(format_percent(0.0), "0.0%");
        assert_eq!(format_percent(1.0), "100.0%");
    }

    #[test]
    fn form_focus_wraps_both_ways() {
        let mut form = ProductForm::default();
        assert_eq!(form.focus, 0);
        form.prev_field();
        assert_eq!(form.focus, 3);
        form.next_field();
        assert_eq!(form.focus, 0);

        form.push_char('9');
        form.push_char('9');
        form.backspace();
        assert_eq!(form.fields[0], "9");
    }
}

fn main() {
    // View-layer state lives here — the entry point is src/bin/tui.rs
}
