use crate::canvas::{CellMetrics, GlyphCanvas};
use crate::config::{Args, Tuning};
use crate::engine::{DriverState, MatrixRain};
use crate::host::{Host, HostEvent};
use crate::term::{Input, Terminal};
use anyhow::Result;
use crossterm::event;
use log::info;
use rand::{rngs::StdRng, SeedableRng};
use std::io::{stdout, IsTerminal};
use std::time::{Duration, Instant};

const IDLE_POLL: Duration = Duration::from_millis(250); // sleep cap while no frame is pending

pub(crate) fn run(args: Args) -> Result<()> {
    let tuning = Tuning::from_args(&args)?;

    if !stdout().is_terminal() {
        info!("stdout is not a terminal; nothing to draw");
        return Ok(());
    }

    let fallback = CellMetrics {
        width: args.cell_width,
        height: args.cell_height,
    };
    let mut term = Terminal::begin(fallback)?;
    let result = drive(&mut term, tuning, args.device_scale);
    // Restore the terminal even when the loop failed.
    term.end()?;
    result
}

fn drive(term: &mut Terminal, tuning: Tuning, device_scale: f32) -> Result<()> {
    let mut host = Host::new(Some(term.viewport()), device_scale, tuning.fps);
    let canvas = GlyphCanvas::new(term.metrics());
    let mut field = MatrixRain::new(tuning, canvas, StdRng::from_entropy());

    if !field.start(&mut host) {
        return Ok(());
    }

    let result = pump(term, &mut host, &mut field);
    field.stop(&mut host);
    result
}

fn pump(
    term: &mut Terminal,
    host: &mut Host,
    field: &mut MatrixRain<GlyphCanvas, StdRng>,
) -> Result<()> {
    loop {
        let wait = host.time_until_frame(Instant::now()).unwrap_or(IDLE_POLL);
        if event::poll(wait)? {
            // Drain everything queued so events never split a frame.
            loop {
                match term.translate(event::read()?) {
                    Input::Quit => return Ok(()),
                    Input::ToggleOverlay => {
                        let overlay = field.overlay_mut();
                        overlay.visible = !overlay.visible;
                    }
                    Input::Host(ev) => {
                        if let HostEvent::Resize(vp) = ev {
                            host.set_viewport(vp);
                        }
                        if host.is_listening(ev.kind()) {
                            field.handle_event(ev);
                        }
                    }
                    Input::Ignored => {}
                }
                if !event::poll(Duration::ZERO)? {
                    break;
                }
            }
        }

        let now = Instant::now();
        if let Some(req) = host.due(now) {
            field.on_frame(host, req, now);
            let viewport = field.viewport().unwrap_or_else(|| term.viewport());
            term.present(field.canvas(), field.overlay(), viewport)?;
        }

        if field.state() == DriverState::Idle {
            return Ok(());
        }
    }
}
