use crate::api::client::FunifierApi;
use crate::data::datatable::ResultTable;
use crate::error::{FunifierError, Result};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Winners of one lottery, optionally with the number of ticket holders
pub struct LotteryReport {
    pub lottery_uid: String,
    pub ticket_uid: String,
    pub winners: ResultTable,
    pub participant_count: Option<i64>,
    pub elapsed: Duration,
}

impl LotteryReport {
    /// Generate a user-friendly status message
    pub fn status_message(&self) -> String {
        let participants = match self.participant_count {
            Some(count) => format!(" out of {} participants", count),
            None => String::new(),
        };
        format!(
            "{} winners{} for lottery {} ({} ms)",
            self.winners.row_count(),
            participants,
            self.lottery_uid,
            self.elapsed.as_millis()
        )
    }
}

/// Runs the queries behind the winners export
pub struct LotteryService<'a> {
    api: &'a FunifierApi,
}

impl<'a> LotteryService<'a> {
    pub fn new(api: &'a FunifierApi) -> Self {
        Self { api }
    }

    /// Fetch the winners with address. With `with_participant_count` the
    /// participant count runs on a second thread at the same time; the two
    /// calls share nothing but the read-only client.
    pub fn winners_report(
        &self,
        lottery_uid: &str,
        ticket_uid: &str,
        with_participant_count: bool,
    ) -> Result<LotteryReport> {
        let lottery_uid = required(lottery_uid, "lottery UID")?;
        let ticket_uid = required(ticket_uid, "ticket UID")?;
        let started = Instant::now();

        let (winners, participant_count) = if with_participant_count {
            thread::scope(|scope| {
                let count = scope.spawn(|| self.api.count_lottery_participants(ticket_uid));
                let winners = self.api.get_lottery_winners_with_address(lottery_uid, ticket_uid);
                let count = count
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
                (winners, Some(count))
            })
        } else {
            (
                self.api
                    .get_lottery_winners_with_address(lottery_uid, ticket_uid),
                None,
            )
        };

        let winners = winners?;
        let participant_count = participant_count.transpose()?;
        warn_on_foreign_rows(&winners, lottery_uid);

        let report = LotteryReport {
            lottery_uid: lottery_uid.to_string(),
            ticket_uid: ticket_uid.to_string(),
            winners,
            participant_count,
            elapsed: started.elapsed(),
        };
        info!("{}", report.status_message());
        Ok(report)
    }
}

fn required<'v>(value: &'v str, label: &str) -> Result<&'v str> {
    if value.trim().is_empty() {
        Err(FunifierError::validation(format!("{} is required", label)))
    } else {
        Ok(value)
    }
}

fn warn_on_foreign_rows(winners: &ResultTable, lottery_uid: &str) {
    let Some(values) = winners.column_values("lotteryUID") else {
        return;
    };
    let foreign = values
        .iter()
        .filter(|v| v.as_str() != Some(lottery_uid))
        .count();
    if foreign > 0 {
        warn!(
            "{} of {} rows belong to a different lottery than {}",
            foreign,
            values.len(),
            lottery_uid
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::api_config::ApiConfig;

    fn offline_api() -> FunifierApi {
        let config = ApiConfig::new("key", "secret", "http://127.0.0.1:9", "v3").unwrap();
        FunifierApi::new(config).unwrap()
    }

    #[test]
    fn test_inputs_are_validated_first() {
        let api = offline_api();
        let service = LotteryService::new(&api);

        let err = service.winners_report(" ", "T1", true).err().unwrap();
        assert!(err.to_string().contains("lottery UID"));

        let err = service.winners_report("L1", "", false).err().unwrap();
        assert!(matches!(err, FunifierError::Validation(_)));
    }

    #[test]
    fn test_status_message() {
        let report = LotteryReport {
            lottery_uid: "L1".to_string(),
            ticket_uid: "T1".to_string(),
            winners: ResultTable::new("winners"),
            participant_count: Some(42),
            elapsed: Duration::from_millis(12),
        };
        assert_eq!(
            report.status_message(),
            "0 winners out of 42 participants for lottery L1 (12 ms)"
        );
    }
}
