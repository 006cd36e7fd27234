use std::time::Duration;

use axum::http::StatusCode;
use tokio::{
    sync::{mpsc, oneshot, watch},
    time::MissedTickBehavior,
};
use tracing::{error, info, warn};

use countdown_common::{
    days_remaining, heartbeat_for_second, render, render_page, show_frame, AlarmSchedule, Banner,
    ClockStore, CountdownError, CountdownStatus, CurrentTime, DisplayState, ErrorDisposition,
    FormSubmission, FormVariant, HardwareError, Prefill, SegmentDisplay, TargetDate,
    ValidationError,
};

#[derive(Debug)]
pub enum ControlRequest {
    FormGet,
    /// Body already decoded by the HTTP layer; decoding failures travel along
    /// so the rejection is rendered with the rest of the page.
    FormPost(Result<FormSubmission, ValidationError>),
    Status,
}

#[derive(Debug)]
pub enum ControlResponse {
    Page { status: StatusCode, html: String },
    Status(CountdownStatus),
}

/// A request plus the slot its answer goes back through.
#[derive(Debug)]
pub struct Exchange {
    pub request: ControlRequest,
    pub reply: oneshot::Sender<ControlResponse>,
}

/// All mutable device state. Owned by the main loop; nothing else writes it.
pub struct CountdownApp<C, D> {
    clock: C,
    display: D,
    form_variant: FormVariant,
    timezone: String,

    target: TargetDate,
    countdown: Option<i64>,
    last_submitted: Option<i64>,

    heartbeat: bool,
    shown: Option<DisplayState>,

    time_synced: bool,
    last_now: Option<CurrentTime>,
}

impl<C: ClockStore, D: SegmentDisplay> CountdownApp<C, D> {
    pub fn new(
        clock: C,
        display: D,
        target: TargetDate,
        form_variant: FormVariant,
        timezone: String,
    ) -> Self {
        Self {
            clock,
            display,
            form_variant,
            timezone,
            target,
            countdown: None,
            last_submitted: None,
            heartbeat: false,
            shown: None,
            time_synced: false,
            last_now: None,
        }
    }

    /// Seeds the clock, arms the daily alarm and shows the first countdown.
    /// Hardware failures skip only the step that hit them; the countdown is
    /// `None` when the clock could not be read, and the first good tick
    /// fills it in.
    pub fn boot(
        &mut self,
        synced: CurrentTime,
        alarm: AlarmSchedule,
        brightness: f32,
    ) -> Option<i64> {
        match self.clock.set_now(synced) {
            Ok(()) => self.time_synced = true,
            Err(err) => report(&err.into()),
        }
        if let Err(err) = self.clock.schedule_alarm(alarm) {
            report(&err.into());
        }
        if let Err(err) = self.display.set_brightness(brightness) {
            report(&err.into());
        }

        let remaining = match self.clock.now() {
            Ok(now) => {
                self.last_now = Some(now);
                self.heartbeat = heartbeat_for_second(now.second());
                Some(self.recompute(&now))
            }
            Err(err) => {
                report(&err.into());
                None
            }
        };

        if let Err(err) = self.refresh_display() {
            report(&err.into());
        }
        remaining
    }

    /// Clock read, heartbeat, alarm check.
    pub fn tick(&mut self) -> Result<(), CountdownError> {
        let now = self.clock.now()?;
        self.last_now = Some(now);
        self.heartbeat = heartbeat_for_second(now.second());

        let fired = self.clock.alarm_fired()?;
        if fired || self.countdown.is_none() {
            let remaining = self.recompute(&now);
            info!("countdown at {now}: {remaining} days remaining");
        }

        self.refresh_display()?;
        Ok(())
    }

    pub fn handle(&mut self, request: ControlRequest) -> ControlResponse {
        match request {
            ControlRequest::FormGet => {
                // Shown once a target was submitted; the value tracks alarm
                // recomputes.
                let banner = self
                    .last_submitted
                    .and(self.countdown)
                    .map(Banner::LastKnown)
                    .unwrap_or(Banner::None);
                self.page(StatusCode::OK, &Prefill::Target(self.target), &banner)
            }
            ControlRequest::FormPost(submission) => self.handle_submission(submission),
            ControlRequest::Status => ControlResponse::Status(self.status()),
        }
    }

    pub fn status(&self) -> CountdownStatus {
        let shown = self.shown.unwrap_or_default();
        CountdownStatus {
            target_date: self.target.to_string(),
            days_remaining: self.countdown,
            last_submitted: self.last_submitted,
            display: shown.text(),
            heartbeat: shown.heartbeat,
            form_variant: self.form_variant,
            time_synced: self.time_synced,
            now: self.last_now.map(|now| now.to_string()),
            next_alarm: self
                .clock
                .next_alarm()
                .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string()),
            timezone: self.timezone.clone(),
        }
    }

    fn handle_submission(
        &mut self,
        submission: Result<FormSubmission, ValidationError>,
    ) -> ControlResponse {
        let submission = match submission {
            Ok(submission) => submission,
            Err(err) => return self.reject(None, err),
        };

        let target = match submission.to_target() {
            Ok(target) => target,
            Err(err) => return self.reject(Some(submission), err),
        };

        let now = match self.clock.now() {
            Ok(now) => now,
            Err(err) => {
                report(&CountdownError::from(err.clone()));
                return self.page(
                    StatusCode::SERVICE_UNAVAILABLE,
                    &Prefill::Raw(submission),
                    &Banner::Rejected(err.to_string()),
                );
            }
        };

        self.target = target;
        self.last_now = Some(now);
        let remaining = self.recompute(&now);
        self.last_submitted = Some(remaining);
        info!("target set to {target}, {remaining} days remaining");

        // The countdown is committed either way; a failed write is retried by
        // the next tick.
        if let Err(err) = self.refresh_display() {
            report(&CountdownError::from(err));
        }

        self.page(
            StatusCode::OK,
            &Prefill::Target(target),
            &Banner::Accepted(remaining),
        )
    }

    fn reject(
        &self,
        submission: Option<FormSubmission>,
        err: ValidationError,
    ) -> ControlResponse {
        report(&CountdownError::from(err.clone()));

        let prefill = submission
            .map(Prefill::Raw)
            .unwrap_or(Prefill::Target(self.target));
        self.page(
            StatusCode::BAD_REQUEST,
            &prefill,
            &Banner::Rejected(err.to_string()),
        )
    }

    fn page(&self, status: StatusCode, prefill: &Prefill, banner: &Banner) -> ControlResponse {
        ControlResponse::Page {
            status,
            html: render_page(self.form_variant, prefill, banner),
        }
    }

    fn recompute(&mut self, now: &CurrentTime) -> i64 {
        let remaining = days_remaining(self.target, now);
        self.countdown = Some(remaining);
        remaining
    }

    /// Brings the hardware in line with the countdown and heartbeat. Only
    /// the indicator is touched when the digits are already correct.
    fn refresh_display(&mut self) -> Result<(), HardwareError> {
        let Some(countdown) = self.countdown else {
            return Ok(());
        };
        let desired = render(countdown, self.heartbeat);

        match self.shown {
            Some(shown) if shown == desired => return Ok(()),
            Some(shown) if shown.digits == desired.digits => {
                self.display.set_heartbeat(desired.heartbeat)?;
            }
            _ => {
                self.shown = None;
                show_frame(&mut self.display, &desired)?;
            }
        }

        self.shown = Some(desired);
        Ok(())
    }
}

pub fn report(err: &CountdownError) {
    match err.disposition() {
        ErrorDisposition::Continue => warn!("transient i/o error, continuing: {err}"),
        ErrorDisposition::SkipOperation => error!("hardware error, operation skipped: {err}"),
        ErrorDisposition::RejectRequest => warn!("form submission rejected: {err}"),
        ErrorDisposition::BootFault => error!("boot fault: {err}"),
    }
}

/// Logs an error once per run of identical failures.
#[derive(Default)]
struct ErrorLatch {
    last: Option<CountdownError>,
}

impl ErrorLatch {
    fn record(&mut self, result: Result<(), CountdownError>) {
        match result {
            Ok(()) => {
                if let Some(previous) = self.last.take() {
                    info!("recovered from: {previous}");
                }
            }
            Err(err) => {
                if self.last.as_ref() != Some(&err) {
                    report(&err);
                }
                self.last = Some(err);
            }
        }
    }
}

/// Answers at most one pending exchange.
fn poll_request<C: ClockStore, D: SegmentDisplay>(
    app: &mut CountdownApp<C, D>,
    requests: &mut mpsc::Receiver<Exchange>,
) -> Result<(), CountdownError> {
    match requests.try_recv() {
        Ok(Exchange { request, reply }) => {
            let response = app.handle(request);
            reply.send(response).map_err(|_| {
                CountdownError::TransientIo("client left before the response was sent".to_string())
            })
        }
        Err(mpsc::error::TryRecvError::Empty) => Ok(()),
        Err(mpsc::error::TryRecvError::Disconnected) => Err(CountdownError::TransientIo(
            "http server is no longer accepting requests".to_string(),
        )),
    }
}

/// Runs until `shutdown` turns true. Errors never end the loop.
pub async fn run_main_loop<C: ClockStore, D: SegmentDisplay>(
    mut app: CountdownApp<C, D>,
    mut requests: mpsc::Receiver<Exchange>,
    mut shutdown: watch::Receiver<bool>,
    poll_interval: Duration,
) -> CountdownApp<C, D> {
    let mut interval = tokio::time::interval(poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut shutdown_open = true;
    let mut tick_errors = ErrorLatch::default();
    let mut request_errors = ErrorLatch::default();

    info!("main loop running, polling every {poll_interval:?}");

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            changed = shutdown.changed(), if shutdown_open => {
                if changed.is_err() {
                    warn!("shutdown signal source dropped; loop continues");
                    shutdown_open = false;
                }
            }
        }

        if *shutdown.borrow() {
            break;
        }

        tick_errors.record(app.tick());
        request_errors.record(poll_request(&mut app, &mut requests));
    }

    info!("main loop stopped");
    app
}
