use reqwest::blocking::Client;
use reqwest::{Method, StatusCode, Url};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use super::a1::CellRef;
use super::{A1Range, ServiceAccountAuth, SheetStore, StoreError, StoreResult};

const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets/";
const VALUE_INPUT_OPTION: &str = "USER_ENTERED";

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

/// Body of the values endpoints, for both reads and writes.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) major_dimension: Option<String>,
    #[serde(default)]
    pub(crate) values: Vec<Vec<serde_json::Value>>,
}

impl ValueRange {
    pub(crate) fn rows(range: &A1Range, rows: &[Vec<String>]) -> Self {
        Self {
            range: Some(range.to_string()),
            major_dimension: Some("ROWS".into()),
            values: rows
                .iter()
                .map(|r| r.iter().map(|v| serde_json::Value::String(v.clone())).collect())
                .collect(),
        }
    }

    /// Cells as display strings, laid out from `A1` of `title`. The API
    /// reports where `values` starts in `range`; rows and columns before
    /// that corner are filled with empty cells.
    pub(crate) fn into_grid(self, title: &str) -> StoreResult<Vec<Vec<String>>> {
        let origin = match self.range.as_deref() {
            Some(raw) => {
                let range = A1Range::parse(raw)?;
                if range.sheet != title {
                    return Err(StoreError::InvalidRange(format!(
                        "asked for {title}, got {raw}"
                    )));
                }
                range.start
            }
            None => CellRef::new(0, 0),
        };
        if self.values.is_empty() {
            return Ok(Vec::new());
        }

        let mut grid = vec![Vec::new(); origin.row];
        grid.extend(self.values.into_iter().map(|row| {
            if row.is_empty() {
                return Vec::new();
            }
            let mut cells = vec![String::new(); origin.col];
            cells.extend(row.into_iter().map(cell_to_string));
            cells
        }));
        Ok(grid)
    }
}

fn cell_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        serde_json::Value::Bool(b) => if b { "TRUE" } else { "FALSE" }.to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Map a non-success response to `StoreError::Api`, using the error message
/// from the JSON body when there is one.
pub(crate) fn api_error(status: u16, body: &str) -> StoreError {
    let message = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(b) if b.error.status.is_empty() => b.error.message,
        Ok(b) => format!("{} ({})", b.error.message, b.error.status),
        Err(_) => body.chars().take(200).collect(),
    };
    StoreError::Api { status, message }
}

/// Sheet reference covering a whole worksheet.
pub(super) fn whole_sheet(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// `{base}{spreadsheet_id}{suffix}/{segments...}`; segments are
/// percent-encoded.
pub(super) fn sheet_url(
    base: &str,
    spreadsheet_id: &str,
    suffix: &str,
    segments: &[&str],
) -> StoreResult<Url> {
    let mut url = Url::parse(base)
        .and_then(|base| base.join(&format!("./{spreadsheet_id}{suffix}")))
        .map_err(|e| StoreError::InvalidUrl(e.to_string()))?;
    if !segments.is_empty() {
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(base.to_string()))?
            .pop_if_empty()
            .extend(segments);
    }
    Ok(url)
}

/// Google Sheets v4 values API, authenticated as a service account.
pub(crate) struct GoogleSheets {
    client: Client,
    auth: ServiceAccountAuth,
    spreadsheet_id: String,
    base_url: String,
}

impl GoogleSheets {
    pub(crate) fn new(spreadsheet_id: &str, auth: ServiceAccountAuth) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("stewardtui/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            auth,
            spreadsheet_id: spreadsheet_id.trim().to_string(),
            base_url: SHEETS_BASE_URL.to_string(),
        })
    }

    fn url(&self, suffix: &str, segments: &[&str]) -> StoreResult<Url> {
        sheet_url(&self.base_url, &self.spreadsheet_id, suffix, segments)
    }

    fn execute<T: DeserializeOwned>(
        &mut self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
    ) -> StoreResult<T> {
        // One extra attempt when the token was revoked or expired early.
        for attempt in 0..2 {
            let token = self.auth.bearer(&self.client)?;
            let mut req = self
                .client
                .request(method.clone(), url.clone())
                .bearer_auth(token);
            if let Some(body) = body {
                req = req.json(body);
            }
            tracing::debug!(%method, url = %url, "sheets request");
            let resp = req.send()?;
            let status = resp.status();
            if status == StatusCode::UNAUTHORIZED && attempt == 0 {
                tracing::info!("access token rejected, refreshing");
                self.auth.invalidate();
                continue;
            }
            let text = resp.text()?;
            if !status.is_success() {
                let err = api_error(status.as_u16(), &text);
                tracing::warn!(%method, url = %url, error = %err, "sheets request failed");
                return Err(err);
            }
            return Ok(serde_json::from_str(&text)?);
        }
        Err(StoreError::Auth("access token rejected twice".into()))
    }
}

impl SheetStore for GoogleSheets {
    fn describe(&self) -> String {
        format!("Google Sheet {}", self.spreadsheet_id)
    }

    fn worksheet_titles(&mut self) -> StoreResult<Vec<String>> {
        let mut url = self.url("", &[])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");
        let meta: SpreadsheetMeta = self.execute(Method::GET, url, None)?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    fn add_worksheet(&mut self, title: &str, cols: usize) -> StoreResult<()> {
        let url = self.url(":batchUpdate", &[])?;
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": title,
                        "gridProperties": { "rowCount": 1000, "columnCount": cols.max(1) }
                    }
                }
            }]
        });
        let _: IgnoredAny = self.execute(Method::POST, url, Some(&body))?;
        tracing::info!(title, "created worksheet");
        Ok(())
    }

    fn get_all_values(&mut self, title: &str) -> StoreResult<Vec<Vec<String>>> {
        let url = self.url("/", &["values", &whole_sheet(title)])?;
        let values: ValueRange = self.execute(Method::GET, url, None)?;
        values.into_grid(title)
    }

    fn update(&mut self, range: &A1Range, rows: &[Vec<String>]) -> StoreResult<()> {
        let range_str = range.to_string();
        let mut url = self.url("/", &["values", &range_str])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", VALUE_INPUT_OPTION);
        let body = serde_json::to_value(ValueRange::rows(range, rows))?;
        let _: IgnoredAny = self.execute(Method::PUT, url, Some(&body))?;
        Ok(())
    }

    fn batch_update(&mut self, updates: &[(A1Range, Vec<Vec<String>>)]) -> StoreResult<()> {
        if updates.is_empty() {
            return Ok(());
        }
        let url = self.url("/", &["values:batchUpdate"])?;
        let data: Vec<ValueRange> = updates
            .iter()
            .map(|(range, rows)| ValueRange::rows(range, rows))
            .collect();
        let body = json!({ "valueInputOption": VALUE_INPUT_OPTION, "data": data });
        let _: IgnoredAny = self.execute(Method::POST, url, Some(&body))?;
        Ok(())
    }

    fn append_row(&mut self, title: &str, row: &[String]) -> StoreResult<()> {
        let anchor = A1Range::cell(title, 0, 0);
        let mut url = self.url("/", &["values", &format!("{anchor}:append")])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", VALUE_INPUT_OPTION)
            .append_pair("insertDataOption", "INSERT_ROWS");
        let body = serde_json::to_value(ValueRange::rows(&anchor, &[row.to_vec()]))?;
        let _: IgnoredAny = self.execute(Method::POST, url, Some(&body))?;
        Ok(())
    }
}
