use std::time::{Duration, Instant};

use sdl2::event::Event;
use sdl2::keyboard::Scancode;
use toumapet_core::core::machine::{InputEvent, InputSource};
use toumapet_system::{FRAME_RATE, RuntimeError, ToumaPetSystem, buttons, keys};

use crate::input::KeyMap;
use crate::overlay;
use crate::screenshot;
use crate::video::Video;

/// SDL event pump wrapped as the console's input source. The console
/// drains it at frame boundaries and from inside the emulated input port.
struct SdlInput {
    pump: sdl2::EventPump,
    key_map: KeyMap,
    screenshot: bool,
    toggle_fps: bool,
}

impl InputSource for SdlInput {
    fn poll(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();
        for event in self.pump.poll_iter() {
            match event {
                Event::Quit { .. } => events.push(InputEvent {
                    button: buttons::QUIT,
                    pressed: true,
                }),

                Event::KeyDown {
                    scancode: Some(Scancode::Escape),
                    ..
                } => events.push(InputEvent {
                    button: buttons::QUIT,
                    pressed: true,
                }),

                Event::KeyDown {
                    scancode: Some(Scancode::F12),
                    repeat: false,
                    ..
                } => self.screenshot = true,

                Event::KeyDown {
                    scancode: Some(Scancode::F),
                    repeat: false,
                    ..
                } => self.toggle_fps = true,

                Event::KeyDown {
                    scancode: Some(sc),
                    repeat: false,
                    ..
                } => {
                    if let Some(button) = self.key_map.get(sc) {
                        events.push(InputEvent {
                            button,
                            pressed: true,
                        });
                    }
                }

                Event::KeyUp {
                    scancode: Some(sc), ..
                } => {
                    if let Some(button) = self.key_map.get(sc) {
                        events.push(InputEvent {
                            button,
                            pressed: false,
                        });
                    }
                }

                _ => {}
            }
        }
        events
    }
}

pub fn run(
    console: &mut ToumaPetSystem,
    zoom: u32,
    mut show_fps: bool,
) -> Result<(), RuntimeError> {
    let sdl_context = sdl2::init().expect("Failed to initialize SDL2");
    let sdl_video = sdl_context.video().expect("Failed to init SDL video");

    let (width, height) = console.display_size();
    let mut video = Video::new(&sdl_video, "TouMaPet", width, height, zoom);
    let pump = sdl_context.event_pump().expect("Failed to get event pump");
    let mut input = SdlInput {
        pump,
        key_map: crate::input::default_key_map(console.input_map()),
        screenshot: false,
        toggle_fps: false,
    };

    let mut framebuffer = vec![0u8; (width * height * 3) as usize];

    console.power_on(&mut input)?;

    let frame_ms = 1000 / FRAME_RATE as u64;
    let mut anchor = Instant::now();
    let mut frame_ix: u64 = 0;
    let mut fps = 0.0f32;
    let mut fps_frames = 0u32;
    let mut fps_window = Instant::now();

    loop {
        console.run_frame(&mut input)?;

        let k = console.keys();
        if k & (keys::QUIT | keys::POWER_OFF) != 0 {
            break;
        }
        if k & keys::RESET != 0 {
            console.reset(&mut input)?;
        }

        console.render_frame(&mut framebuffer);
        if input.toggle_fps {
            input.toggle_fps = false;
            show_fps = !show_fps;
        }
        if show_fps {
            overlay::draw_fps(&mut framebuffer, width as usize, &format!("{fps:.1}"));
        }
        video.present(&framebuffer);

        if input.screenshot {
            input.screenshot = false;
            match screenshot::save(&framebuffer, width, height) {
                Ok(path) => log::info!("screenshot written to {}", path.display()),
                Err(e) => log::warn!("screenshot failed: {e}"),
            }
        }

        frame_ix += 1;
        fps_frames += 1;
        let window = fps_window.elapsed();
        if window >= Duration::from_secs(1) {
            fps = fps_frames as f32 / window.as_secs_f32();
            fps_frames = 0;
            fps_window = Instant::now();
        }

        // Fixed-rate pacing against a display anchor; a missed deadline
        // reseeds the anchor instead of fast-forwarding.
        let target = anchor + Duration::from_millis(frame_ix * frame_ms);
        let now = Instant::now();
        if target > now {
            std::thread::sleep(target - now);
        } else {
            anchor = now;
            frame_ix = 0;
        }
    }
    Ok(())
}
