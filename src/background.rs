use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use tokio::time::sleep;
use tracing::{error, info, info_span, Instrument};
use crate::state::AppState;
use crate::domain::models::job::{
    Job, CLAIM_LEASE_SECS, JOB_BOOKING_CANCELED, JOB_BOOKING_CONFIRMED, JOB_PROCESS_PAYMENT,
    STATUS_COMPLETED, STATUS_FAILED,
};
use crate::error::AppError;

const BATCH_SIZE: i32 = 10;
const TOKEN_PURGE_EVERY: u64 = 60;

pub async fn start_background_worker(state: Arc<AppState>) {
    info!("Starting background job worker...");

    let interval = Duration::from_secs(state.config.job_poll_interval_secs.max(1));
    let mut ticks: u64 = 0;

    loop {
        run_pending_jobs(&state).await;

        if ticks % TOKEN_PURGE_EVERY == 0 {
            match state.auth_repo.delete_expired(Utc::now()).await {
                Ok(0) => {}
                Ok(n) => info!("Purged {} expired refresh tokens", n),
                Err(e) => error!("Failed to purge refresh tokens: {:?}", e),
            }
        }
        ticks = ticks.wrapping_add(1);

        sleep(interval).await;
    }
}

/// Claims and runs one batch of due jobs. Returns how many were claimed.
pub async fn run_pending_jobs(state: &Arc<AppState>) -> usize {
    let jobs = match state.job_repo.find_pending(BATCH_SIZE, chrono::Duration::seconds(CLAIM_LEASE_SECS)).await {
        Ok(jobs) => jobs,
        Err(e) => {
            error!("Failed to fetch pending jobs: {:?}", e);
            return 0;
        }
    };

    let claimed = jobs.len();

    for job in jobs {
        let span = info_span!(
            "background_job",
            job_id = %job.id,
            job_type = %job.job_type,
            booking_id = %job.payload.booking_id
        );

        async {
            info!("Processing job: {}", job.job_type);
            match process_job(state, &job).await {
                Ok(_) => {
                    info!("Job completed successfully");
                    if let Err(e) = state.job_repo.update_status(&job.id, STATUS_COMPLETED, None).await {
                        error!("Failed to mark job as completed: {:?}", e);
                    }
                }
                Err(e) => {
                    let err_msg = format!("{}", e);
                    error!("Job failed with error: {}", err_msg);
                    if let Err(up_err) = state.job_repo.update_status(&job.id, STATUS_FAILED, Some(err_msg)).await {
                        error!("Failed to mark job as failed: {:?}", up_err);
                    }
                }
            }
        }
            .instrument(span)
            .await;
    }

    claimed
}

async fn process_job(state: &Arc<AppState>, job: &Job) -> Result<(), AppError> {
    match job.job_type.as_str() {
        JOB_PROCESS_PAYMENT => {
            let payment_id = job.payload.payment_id.as_deref()
                .ok_or(AppError::InternalWithMsg("Payment job without payment_id".into()))?;
            let payment = state.payment_service.process(payment_id).await?;
            info!("Payment {} settled as {:?}", payment.id, payment.status);
            Ok(())
        }
        JOB_BOOKING_CONFIRMED | JOB_BOOKING_CANCELED => {
            state.notification_service
                .send_booking_notice(&job.job_type, &job.payload.booking_id)
                .await
        }
        other => Err(AppError::InternalWithMsg(format!("Unknown job type {}", other))),
    }
}
