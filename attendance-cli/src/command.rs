use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use attendance_core::domain::models::{
    LeaveDraft, LeaveId, LeaveStatus, LeaveType, TaskId, TaskStatus,
};
use strum::{Display, EnumString};

use crate::cli::parse_date;

/// Draft key used for the single form the driver can stash.
pub const DRAFT_KEY: &str = "new";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
enum Keyword {
    Help,
    Status,
    In,
    Out,
    Task,
    Tasks,
    Mark,
    Leave,
    Edit,
    Delete,
    Approve,
    Reject,
    Leaves,
    Quota,
    Draft,
    SubmitDraft,
    Watch,
    Offline,
    Online,
    #[strum(serialize = "quit", serialize = "exit")]
    Quit,
}

/// One line typed into the interactive driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Status,
    ClockIn,
    ClockOut,
    AddTask(String),
    Tasks,
    MarkTask { id: TaskId, status: TaskStatus },
    SubmitLeave(LeaveDraft),
    DeleteLeave(LeaveId),
    ReviewLeave { id: LeaveId, decision: LeaveStatus },
    Leaves(Option<LeaveStatus>),
    Quota,
    StashDraft(LeaveDraft),
    SubmitDraft,
    Watch { seconds: u64 },
    SetOffline(bool),
    Quit,
}

pub const HELP: &str = "\
commands:
  status                                   show the session of the business day
  in | out                                 clock in or out
  task <title>                             add a task to the active session
  tasks                                    list tasks and statistics
  mark <task-id> <status>                  pending | in-progress | completed
  leave <type> <start> [end] <reason>      casual | sick | half-day | short-leave
  edit <leave-id> <type> <start> [end] <reason>
  delete <leave-id>                        withdraw a pending request
  approve <leave-id> | reject <leave-id>   review a pending request
  leaves [status]                          list requests, newest first
  quota                                    remaining leave days
  draft <type> <start> [end] <reason>      keep a form for later
  submit-draft                             submit the kept form
  watch [seconds]                          follow the elapsed time
  offline | online                         toggle the dev store
  quit";

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let keyword = words.next().ok_or_else(|| anyhow!("empty command"))?;
        let keyword = Keyword::from_str(keyword)
            .map_err(|_| anyhow!("unknown command '{keyword}', try 'help'"))?;
        let args: Vec<&str> = words.collect();

        let command = match keyword {
            Keyword::Help => Command::Help,
            Keyword::Status => Command::Status,
            Keyword::In => Command::ClockIn,
            Keyword::Out => Command::ClockOut,
            Keyword::Task => Command::AddTask(args.join(" ")),
            Keyword::Tasks => Command::Tasks,
            Keyword::Mark => {
                let [id, status] = args[..] else {
                    bail!("usage: mark <task-id> <status>");
                };
                Command::MarkTask {
                    id: TaskId::new(id),
                    status: TaskStatus::from_str(status)
                        .with_context(|| format!("unknown task status '{status}'"))?,
                }
            }
            Keyword::Leave => Command::SubmitLeave(parse_draft(&args)?),
            Keyword::Edit => {
                let (id, rest) = args
                    .split_first()
                    .ok_or_else(|| anyhow!("usage: edit <leave-id> <type> <start> [end] <reason>"))?;
                Command::SubmitLeave(parse_draft(rest)?.editing(*id))
            }
            Keyword::Delete => Command::DeleteLeave(LeaveId::new(single_arg(&args, "delete")?)),
            Keyword::Approve => Command::ReviewLeave {
                id: LeaveId::new(single_arg(&args, "approve")?),
                decision: LeaveStatus::Approved,
            },
            Keyword::Reject => Command::ReviewLeave {
                id: LeaveId::new(single_arg(&args, "reject")?),
                decision: LeaveStatus::Rejected,
            },
            Keyword::Leaves => match args.first() {
                Some(status) => Command::Leaves(Some(
                    LeaveStatus::from_str(status)
                        .with_context(|| format!("unknown leave status '{status}'"))?,
                )),
                None => Command::Leaves(None),
            },
            Keyword::Quota => Command::Quota,
            Keyword::Draft => Command::StashDraft(parse_draft(&args)?),
            Keyword::SubmitDraft => Command::SubmitDraft,
            Keyword::Watch => Command::Watch {
                seconds: match args.first() {
                    Some(raw) => raw
                        .parse()
                        .with_context(|| format!("invalid number of seconds '{raw}'"))?,
                    None => 5,
                },
            },
            Keyword::Offline => Command::SetOffline(true),
            Keyword::Online => Command::SetOffline(false),
            Keyword::Quit => Command::Quit,
        };
        Ok(command)
    }
}

fn single_arg<'a>(args: &[&'a str], command: &str) -> Result<&'a str> {
    match args {
        [arg] => Ok(*arg),
        _ => bail!("usage: {command} <leave-id>"),
    }
}

/// `<type> <start> [end] <reason...>`; without an end date the leave covers
/// only the start date.
fn parse_draft(args: &[&str]) -> Result<LeaveDraft> {
    let [leave_type, start, rest @ ..] = args else {
        bail!("usage: <type> <start> [end] <reason>");
    };
    let leave_type = LeaveType::from_str(leave_type)
        .with_context(|| format!("unknown leave type '{leave_type}'"))?;
    let start = parse_date(start).map_err(|e| anyhow!(e))?;

    let (end, reason) = match rest.split_first() {
        Some((candidate, reason)) => match parse_date(candidate) {
            Ok(end) => (end, reason),
            Err(_) => (start, rest),
        },
        None => (start, rest),
    };

    Ok(LeaveDraft::new(leave_type, start, end, reason.join(" ")))
}
