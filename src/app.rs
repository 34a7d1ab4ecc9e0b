use crate::actions::{self, Action};
use crate::config::{
    load_rules, load_settings, project_paths, save_settings_atomic, Paths, Rules, Settings,
};
use crate::decay;
use crate::emotion::{self, Emotion};
use crate::model::{CatchupReport, Event, Notice, Pet, Snapshot};
use crate::progress;
use crate::storage::{load_or_init, save_atomic};
use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};
use rand::{rngs::StdRng, SeedableRng};
use std::io::BufRead;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

/// One periodic cadence. Re-arming from "now" keeps every task single-flight
/// and stops a stalled process from replaying a burst of missed deadlines.
struct Task {
    next: Instant,
    every: Duration,
}

impl Task {
    fn new(every: Duration) -> Self {
        Self {
            next: Instant::now() + every,
            every,
        }
    }

    fn due(&mut self, now: Instant) -> bool {
        if now >= self.next {
            self.next = now + self.every;
            true
        } else {
            false
        }
    }
}

enum Command {
    Act(Action),
    Status,
    Quit,
}

pub(crate) struct App {
    paths: Paths,
    settings: Settings,
    rules: Rules,
    pet: Pet,
    rng: StdRng,
    notices: Vec<Notice>,
    emotion: Emotion,
    last_decay: Instant,
    decay_task: Task,
    aging_task: Task,
    health_task: Task,
    poop_task: Task,
    autosave_task: Task,
    event_task: Task,
    should_quit: bool,
}

impl App {
    fn init() -> Result<Self> {
        let paths = project_paths()?;
        let settings = load_settings(&paths.settings_path);
        let rules = load_rules(&paths.rules_path);

        let now = Utc::now();
        let (mut pet, loaded_last_save) =
            load_or_init(&paths.save_path, &settings.pet_name, now, &rules);

        // One-shot reconciliation for the time we were gone.
        if let Some(last_save) = loaded_last_save {
            let report = decay::apply_offline_catchup(&mut pet, last_save, now, &rules);
            print_catchup(&pet, &report);
        } else {
            println!("A new pet named {} is born!", pet.name);
        }

        let emotion = emotion::resolve(&pet, &rules);
        let rng = StdRng::seed_from_u64(settings.seed);

        let app = Self {
            decay_task: Task::new(Duration::from_secs(rules.decay_secs)),
            aging_task: Task::new(Duration::from_secs(rules.aging_secs)),
            health_task: Task::new(Duration::from_secs(rules.health_secs)),
            poop_task: Task::new(Duration::from_secs(rules.poop_secs)),
            autosave_task: Task::new(Duration::from_secs(rules.autosave_secs)),
            event_task: Task::new(Duration::from_secs(rules.event_secs)),
            last_decay: Instant::now(),
            paths,
            settings,
            rules,
            pet,
            rng,
            notices: Vec::new(),
            emotion,
            should_quit: false,
        };
        println!("{}", app.status_line());
        Ok(app)
    }

    fn run(&mut self) -> Result<()> {
        let (tx, rx) = mpsc::channel::<Command>();
        spawn_input_reader(tx);

        while !self.should_quit {
            let timeout = self
                .next_deadline()
                .saturating_duration_since(Instant::now());

            // All pet mutation happens on this thread, so scheduled decay and
            // player actions can never interleave mid-update.
            match rx.recv_timeout(timeout) {
                Ok(Command::Act(action)) => self.handle_action(action),
                Ok(Command::Status) => self.print_snapshot(),
                Ok(Command::Quit) | Err(RecvTimeoutError::Disconnected) => {
                    self.should_quit = true;
                }
                Err(RecvTimeoutError::Timeout) => {}
            }

            self.run_due_tasks();
        }

        self.save_now();
        if let Err(err) = save_settings_atomic(&self.paths.settings_path, &self.settings) {
            tracing::warn!(%err, "could not save settings");
        }
        Ok(())
    }

    fn next_deadline(&self) -> Instant {
        [
            self.decay_task.next,
            self.aging_task.next,
            self.health_task.next,
            self.poop_task.next,
            self.autosave_task.next,
            self.event_task.next,
        ]
        .into_iter()
        .min()
        .unwrap_or_else(Instant::now)
    }

    fn run_due_tasks(&mut self) {
        let now = Instant::now();

        if self.decay_task.due(now) {
            let elapsed = now.saturating_duration_since(self.last_decay);
            self.last_decay = now;
            decay::apply_continuous(&mut self.pet, elapsed, &self.rules);
            self.refresh(Vec::new());
        }
        if self.aging_task.due(now) {
            decay::age_tick(&mut self.pet);
            self.refresh(Vec::new());
        }
        if self.health_task.due(now) {
            let events = decay::health_check(&mut self.pet, &mut self.rng, &self.rules);
            self.refresh(events);
        }
        if self.poop_task.due(now) {
            decay::poop_roll(&mut self.pet, &mut self.rng, &self.rules);
            self.refresh(Vec::new());
        }
        if self.event_task.due(now) {
            let events = progress::random_event(&mut self.pet, &mut self.rng, &self.rules);
            self.refresh(events);
        }
        if self.autosave_task.due(now) {
            self.save_now();
        }
    }

    fn handle_action(&mut self, action: Action) {
        let events = actions::apply(&mut self.pet, action, &mut self.rng, &self.rules, Utc::now());
        self.refresh(events);
        println!("{}", self.status_line());
    }

    /// Fold fresh events into notices, drop expired ones, and re-derive the
    /// display emotion. Called after every mutation.
    fn refresh(&mut self, events: Vec<Event>) {
        let now = Utc::now();
        self.notices.retain(|n| n.expires_at > now);
        for event in events {
            if matches!(event, Event::Died) {
                tracing::info!(name = %self.pet.name, "pet died");
            }
            println!("{}", event_line(&event));
            self.notices.push(Notice {
                event,
                expires_at: now + ChronoDuration::seconds(self.rules.notice_ttl_secs),
            });
        }

        let emotion = emotion::resolve(&self.pet, &self.rules);
        if emotion != self.emotion {
            self.emotion = emotion;
            println!("{}", self.status_line());
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            pet: self.pet.clone(),
            emotion: self.emotion,
            notices: self.notices.clone(),
        }
    }

    fn print_snapshot(&self) {
        match serde_json::to_string(&self.snapshot()) {
            Ok(json) => println!("{json}"),
            Err(err) => tracing::warn!(%err, "could not serialize snapshot"),
        }
    }

    fn status_line(&self) -> String {
        let p = &self.pet;
        format!(
            "{} [{:?}] Lv.{} xp {} | hunger {:.0} happy {:.0} energy {:.0} health {:.0} | weight {:.1} poop {} commits {}",
            p.name,
            self.emotion,
            p.level,
            p.xp,
            p.hunger,
            p.happiness,
            p.energy,
            p.health,
            p.weight,
            p.poop_count,
            p.total_commits,
        )
    }

    /// Write failures cost the save, never the session.
    fn save_now(&self) {
        if let Err(err) = save_atomic(&self.paths.save_path, &self.pet, Utc::now()) {
            tracing::warn!(path = %self.paths.save_path.display(), %err, "autosave failed");
        }
    }
}

fn print_catchup(pet: &Pet, report: &CatchupReport) {
    if report.has_anything() {
        println!(
            "Welcome back! {} was alone for {} minutes (hunger -{:.0}, happiness -{:.0}, energy -{:.0}).",
            pet.name, report.away_minutes, report.hunger_lost, report.happiness_lost, report.energy_lost,
        );
    } else {
        println!("Welcome back! {} missed you!", pet.name);
    }
}

fn event_line(event: &Event) -> String {
    match event {
        Event::LevelUp { level } => format!("LEVEL UP! Now level {level}!"),
        Event::AchievementUnlocked { name } => format!("Achievement unlocked: {name}!"),
        Event::Died => "Your pet has passed on. Type `restart` to hatch again.".to_string(),
        Event::ActionRefused { reason } => reason.clone(),
        Event::ActionAck { message } => message.clone(),
        Event::XpGained { amount } => format!("+{amount} XP"),
        Event::RandomEvent { message, xp } => format!("{message} (+{xp} XP)"),
    }
}

fn spawn_input_reader(tx: Sender<Command>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let word = line.trim();
            if word.is_empty() {
                continue;
            }
            let cmd = match word.to_ascii_lowercase().as_str() {
                "quit" | "q" => Command::Quit,
                "status" => Command::Status,
                other => match Action::parse(other) {
                    Some(action) => Command::Act(action),
                    None => {
                        eprintln!("unknown command: {word} (try feed/play/rest/work/clean/restart/status/quit)");
                        continue;
                    }
                },
            };
            let quitting = matches!(cmd, Command::Quit);
            if tx.send(cmd).is_err() || quitting {
                break;
            }
        }
    });
}

pub(crate) fn run() -> Result<()> {
    let mut app = App::init()?;
    app.run()
}
