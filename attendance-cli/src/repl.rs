use std::{sync::Arc, time::Duration};

use anyhow::Result;
use attendance_core::{
    adapters::outbound::{FileCache, InMemoryRemoteStore, SystemClock},
    domain::{
        models::{Actor, LeaveFilter, LeaveRequest, SessionView, Task, TaskStatistics},
        ports::inbound::AttendanceLifecycle,
        services::{compute_duration, LifecycleFacade, LifecycleHandle},
    },
};
use time::Date;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::command::{Command, DRAFT_KEY, HELP};

type Facade = LifecycleFacade<InMemoryRemoteStore, FileCache, SystemClock>;

/// Line-oriented front end over the lifecycle engine and the dev store.
pub struct Repl {
    handle: LifecycleHandle<Facade>,
    store: InMemoryRemoteStore,
    tick_interval: Duration,
}

enum Flow {
    Continue,
    Quit,
}

impl Repl {
    pub fn new(
        store: InMemoryRemoteStore,
        cache: FileCache,
        actor: Actor,
        business_date: Date,
        tick_interval: Duration,
    ) -> Self {
        let facade = LifecycleFacade::new(
            Arc::new(store.clone()),
            Arc::new(cache),
            Arc::new(SystemClock::local()),
            actor,
            business_date,
        );
        Self {
            handle: LifecycleHandle::new(facade),
            store,
            tick_interval,
        }
    }

    pub async fn run(&self) -> Result<()> {
        {
            let mut lifecycle = self.handle.acquire()?;
            let date = lifecycle.business_date();
            let view = lifecycle.load(date).await?;
            println!(
                "{} ({}) on {}",
                lifecycle.actor().employee_id,
                lifecycle.actor().role,
                date
            );
            print_session(&view);
        }
        println!("Type 'help' for commands.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let command = match line.parse::<Command>() {
                Ok(command) => command,
                Err(e) => {
                    println!("error: {e:#}");
                    continue;
                }
            };

            match self.execute(command).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(e) => println!("error: {e:#}"),
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    async fn execute(&self, command: Command) -> Result<Flow> {
        let mut lifecycle = self.handle.acquire()?;

        match command {
            Command::Help => println!("{HELP}"),
            Command::Status => print_session(&lifecycle.session()),
            Command::ClockIn => {
                let record = lifecycle.clock_in().await?;
                println!("Clocked in at {}", record.clock_in.time());
            }
            Command::ClockOut => {
                let record = lifecycle.clock_out().await?;
                println!(
                    "Clocked out, {:.2} hours worked",
                    record.total_hours_worked.unwrap_or_default()
                );
            }
            Command::AddTask(title) => {
                let task = lifecycle.add_task(&title).await?;
                println!("Added {}", format_task(&task));
            }
            Command::Tasks => {
                for task in lifecycle.tasks() {
                    println!("  {}", format_task(task));
                }
                print_statistics(&lifecycle.task_statistics());
            }
            Command::MarkTask { id, status } => {
                let task = lifecycle.update_task_status(&id, status).await?;
                println!("Updated {}", format_task(&task));
            }
            Command::SubmitLeave(draft) => {
                let request = lifecycle.submit_leave(&draft).await?;
                println!("Saved {}", format_leave(&request));
            }
            Command::DeleteLeave(id) => {
                lifecycle.delete_leave(&id).await?;
                println!("Deleted {id}");
            }
            Command::ReviewLeave { id, decision } => {
                let request = lifecycle.review_leave(&id, decision).await?;
                println!("Reviewed {}", format_leave(&request));
            }
            Command::Leaves(status) => {
                lifecycle.refresh_leaves().await?;
                let filter = LeaveFilter {
                    status,
                    ..LeaveFilter::default()
                };
                let requests = lifecycle.leaves(&filter);
                if requests.is_empty() {
                    println!("No leave requests");
                }
                for request in requests {
                    println!("  {}", format_leave(request));
                }
            }
            Command::Quota => match lifecycle.leave_quota() {
                Some(quota) => println!("{:.2} leave days remaining", quota.remaining_days),
                None => println!("Quota unknown, try 'leaves' to refresh"),
            },
            Command::StashDraft(draft) => {
                lifecycle.stash_leave_draft(DRAFT_KEY, &draft);
                println!("Draft kept, 'submit-draft' sends it");
            }
            Command::SubmitDraft => match lifecycle.restore_leave_draft(DRAFT_KEY) {
                Some(draft) => {
                    let request = lifecycle.submit_leave(&draft).await?;
                    lifecycle.discard_leave_draft(DRAFT_KEY);
                    println!("Saved {}", format_leave(&request));
                }
                None => println!("No draft kept"),
            },
            Command::Watch { seconds } => {
                let ticker = lifecycle.elapsed_ticker();
                drop(lifecycle);

                let task = ticker.spawn(self.tick_interval, |phase, elapsed| {
                    println!("  {phase} {elapsed}");
                });
                tokio::time::sleep(Duration::from_secs(seconds)).await;
                task.abort();
            }
            Command::SetOffline(offline) => {
                self.store.set_offline(offline);
                println!("Dev store is {}", if offline { "offline" } else { "online" });
            }
            Command::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }
}

fn print_session(view: &SessionView) {
    match &view.record {
        Some(record) => {
            println!(
                "Session {} ({}), clocked in at {}",
                view.phase,
                record.id,
                record.clock_in.time()
            );
            if let Some(clock_out) = record.clock_out {
                println!(
                    "Clocked out at {}, {:.2} hours",
                    clock_out.time(),
                    record.total_hours_worked.unwrap_or_default()
                );
            }
            println!("Elapsed {} [source: {}]", view.elapsed, view.source);
        }
        None => println!("No session yet [source: {}]", view.source),
    }
}

fn print_statistics(stats: &TaskStatistics) {
    println!(
        "total {} | pending {} | in progress {} | completed {}",
        stats.total, stats.pending, stats.in_progress, stats.completed
    );
}

fn format_task(task: &Task) -> String {
    format!("{} [{}] {}", task.id, task.status, task.title)
}

fn format_leave(request: &LeaveRequest) -> String {
    let days = compute_duration(request.start_date, request.end_date, request.leave_type);
    format!(
        "{} {} [{}] {}..{} ({} days) {} - {}",
        request.id,
        request.employee_id,
        request.status,
        request.start_date,
        request.end_date,
        days,
        request.leave_type,
        request.reason
    )
}
