use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::config::MenuConfig;
use crate::display::DisplaySink;
use crate::idle::{IdleState, IdleTimer};
use crate::input::{Button, ButtonLevels, InputSource, PressTracker};
use crate::menu::MenuId;
use crate::system::{SystemActionExecutor, SystemInfoProvider};

use super::screen::{Screen, ScreenContext, ScreenKind, Transition};
use super::ExitReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Exit(ExitReason),
}

/// Owns the display, the buttons and the stack of open screens, and runs
/// one poll per tick. Nothing a screen does escapes this type as an error:
/// failures are logged and the loop carries on.
pub struct ScreenController<D, I> {
    display: D,
    input: I,
    info: Box<dyn SystemInfoProvider>,
    actions: Box<dyn SystemActionExecutor>,
    stack: Vec<Screen>,
    idle: IdleTimer,
    tracker: PressTracker,
    tick: Duration,
}

impl<D: DisplaySink, I: InputSource> ScreenController<D, I> {
    pub fn new(
        display: D,
        input: I,
        info: Box<dyn SystemInfoProvider>,
        actions: Box<dyn SystemActionExecutor>,
        config: &MenuConfig,
    ) -> Self {
        let timing = &config.timing;
        Self {
            display,
            input,
            info,
            actions,
            stack: Vec::new(),
            idle: IdleTimer::new(timing.idle_timeout(), timing.tick_interval()),
            tracker: PressTracker::new(timing.repeat_ticks()),
            tick: timing.tick_interval(),
        }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn idle_state(&self) -> IdleState {
        self.idle.state()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn screen_kind(&self) -> Option<ScreenKind> {
        self.stack.last().map(Screen::kind)
    }

    pub fn current_menu(&self) -> Option<&MenuId> {
        self.stack.last().and_then(Screen::menu_id)
    }

    /// Opens the main menu. Buttons already held at startup are ignored
    /// until released.
    pub fn start(&mut self) {
        self.stack.clear();
        match Screen::menu(MenuId::Main, self.info.as_ref(), &mut self.display) {
            Ok(screen) => self.stack.push(screen),
            Err(err) => error!("Failed to draw main menu: {:#}", err),
        }
        let levels = self.read_levels();
        self.tracker.reset(levels);
        self.idle.wake();
    }

    /// One poll of the buttons.
    pub fn step(&mut self) -> TickOutcome {
        let levels = self.read_levels();
        let presses = self.tracker.update(levels);

        if self.idle.is_saving() {
            if !presses.is_empty() {
                self.wake();
            }
            return TickOutcome::Continue;
        }

        if presses.is_empty() {
            if self.idle.tick() {
                self.sleep_display();
            }
            return TickOutcome::Continue;
        }

        self.idle.touch();
        for button in presses {
            match self.dispatch(button) {
                Ok(Transition::Stay) => {}
                Ok(Transition::Exit(reason)) => {
                    info!("Menu loop exiting: {:?}", reason);
                    return TickOutcome::Exit(reason);
                }
                Ok(transition) => {
                    self.apply(transition);
                    // Remaining presses were aimed at the previous screen.
                    break;
                }
                Err(err) => {
                    warn!("{:?} handling failed: {:#}", button, err);
                }
            }
        }
        TickOutcome::Continue
    }

    /// Polls until a terminal menu action or until `stop` is raised. On a
    /// stop request the display is released before returning. Opens the main
    /// menu first unless `start` already ran.
    pub fn run(&mut self, stop: &AtomicBool) -> ExitReason {
        if self.stack.is_empty() {
            self.start();
        }
        loop {
            if stop.load(Ordering::SeqCst) {
                self.release();
                return ExitReason::Signal;
            }
            if let TickOutcome::Exit(reason) = self.step() {
                return reason;
            }
            thread::sleep(self.tick);
        }
    }

    /// Stops driving the display: no cursor, no blink, blank and dark.
    pub fn release(&mut self) {
        let result = (|| -> Result<()> {
            self.display.set_cursor_blink(false)?;
            self.display.set_cursor_visible(false)?;
            self.display.clear()?;
            self.display.set_display_on(false)?;
            self.display.set_backlight(false)
        })();
        if let Err(err) = result {
            warn!("Failed to release display: {:#}", err);
        }
    }

    fn read_levels(&mut self) -> ButtonLevels {
        match self.input.read() {
            Ok(levels) => levels,
            Err(err) => {
                warn!("Button read failed: {:#}", err);
                ButtonLevels::RELEASED
            }
        }
    }

    fn dispatch(&mut self, button: Button) -> Result<Transition> {
        let is_root = self.stack.len() <= 1;
        let Some(screen) = self.stack.last_mut() else {
            return Ok(Transition::Stay);
        };
        let mut ctx = ScreenContext {
            display: &mut self.display,
            info: self.info.as_ref(),
            actions: self.actions.as_ref(),
            is_root,
        };
        screen.handle(button, &mut ctx)
    }

    fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::Stay | Transition::Exit(_) => {}
            Transition::Push(screen) => self.stack.push(screen),
            Transition::Replace(screen) => {
                self.stack.pop();
                self.stack.push(screen);
            }
            Transition::Pop => {
                if self.stack.len() > 1 {
                    self.stack.pop();
                }
                self.redraw_top();
            }
        }
    }

    fn redraw_top(&mut self) {
        if let Some(screen) = self.stack.last_mut() {
            if let Err(err) = screen.draw_initial(&mut self.display) {
                warn!("Redraw failed: {:#}", err);
            }
        }
    }

    fn sleep_display(&mut self) {
        info!("Idle timeout reached, blanking display");
        self.release();
    }

    fn wake(&mut self) {
        info!("Waking display");
        self.idle.wake();
        let result = self
            .display
            .set_display_on(true)
            .and_then(|_| self.display.set_backlight(true));
        if let Err(err) = result {
            warn!("Failed to wake display: {:#}", err);
        }
        self.redraw_top();
    }
}
