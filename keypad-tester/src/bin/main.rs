//! MIDI pad tester for the TTP229 keypad driver.
//!
//! Wires a 16-key TTP229 board to the driver in interrupt mode and routes
//! every transition to exactly one downstream emitter: a serial-MIDI note
//! source (keys 3..=16, with keys 1 and 2 shifting the octave) or a text
//! injector. A pixel indicator mirrors activity; here it is backed by the
//! log so the tester runs on a bare devkit.

#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use esp_hal::uart::Uart;
use esp_hal::Async;
use esp_hal::{
    clock::CpuClock,
    gpio::{Input, InputConfig, Level, Output, OutputConfig},
    timer::systimer::SystemTimer,
};
use esp_println::println;
use log::{info, warn};
use ttp229_async::{ButtonEvent, EventMode, KeyCount, Ttp229};

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    println!("{}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
esp_bootloader_esp_idf::esp_app_desc!();

/// Which emitter consumes the button events.
#[derive(Clone, Copy, PartialEq, Eq)]
enum OperatingMode {
    Midi,
    Keyboard,
}

const MODE: OperatingMode = OperatingMode::Midi;

/// Classic serial MIDI baud rate.
const MIDI_BAUD: u32 = 31250;

/// Interface to the pixel indicator. The real device is a single NeoPixel;
/// the dispatch loop only ever asks for a color and a latch.
trait Indicator {
    fn set_color(&mut self, r: u8, g: u8, b: u8);
    fn show(&mut self);
}

/// Log-backed stand-in for the NeoPixel.
struct LogIndicator {
    color: (u8, u8, u8),
}

impl LogIndicator {
    fn new() -> Self {
        Self { color: (0, 0, 0) }
    }
}

impl Indicator for LogIndicator {
    fn set_color(&mut self, r: u8, g: u8, b: u8) {
        self.color = (r, g, b);
    }

    fn show(&mut self) {
        let (r, g, b) = self.color;
        info!("indicator: #{r:02x}{g:02x}{b:02x}");
    }
}

/// Turns button transitions into serial MIDI messages.
///
/// Keys 1 and 2 shift the octave up/down, keys 3 and 4 play on channel 1,
/// keys 5..=16 are melodic notes on channel 0.
struct MidiPad<I: Indicator> {
    uart: Uart<'static, Async>,
    indicator: I,
    octave: i8,
}

impl<I: Indicator> MidiPad<I> {
    fn new(uart: Uart<'static, Async>, indicator: I) -> Self {
        Self {
            uart,
            indicator,
            octave: 0,
        }
    }

    async fn send(&mut self, message: [u8; 3]) {
        if let Err(err) = self.uart.write_async(&message).await {
            warn!("midi: uart write failed: {err:?}");
        }
    }

    async fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8) {
        self.send([0x90 | channel, pitch, velocity]).await;
    }

    async fn note_off(&mut self, channel: u8, pitch: u8, velocity: u8) {
        self.send([0x80 | channel, pitch, velocity]).await;
    }

    fn shift_octave(&mut self, semitones: i8) {
        self.octave = (self.octave + semitones).clamp(-48, 60);
        info!("midi: octave {}", self.octave);
    }

    async fn handle(&mut self, event: &ButtonEvent) {
        match event.key {
            1 if !event.released => {
                self.shift_octave(12);
                self.indicator.set_color(255, 255, 255);
            }
            2 if !event.released => {
                self.shift_octave(-12);
                self.indicator.set_color(255, 255, 255);
            }
            key @ 3..=4 => {
                let pitch = 48 + key;
                if event.released {
                    self.note_off(1, pitch, 0).await;
                    self.indicator.set_color(255, 0, 30);
                } else {
                    self.note_on(1, pitch, 110).await;
                    self.indicator.set_color(0, 0, 255);
                }
            }
            key @ 5..=16 => {
                let pitch = (43 + key as i16 + self.octave as i16).clamp(0, 127) as u8;
                if event.released {
                    self.note_off(0, pitch, 0).await;
                    self.indicator
                        .set_color(100u8.saturating_add(key * 5), 0, 128 - key * 5);
                } else {
                    self.note_on(0, pitch, 110).await;
                    self.indicator.set_color(54, 30, 128);
                }
            }
            _ => {}
        }
        self.indicator.show();
    }
}

/// Types canned text on key presses; stands in for a USB HID keyboard.
struct TextInjector;

impl TextInjector {
    fn handle(&mut self, event: &ButtonEvent) {
        if event.released {
            return;
        }
        match event.key {
            1 => info!("keyboard: typing \"Hello\""),
            key => info!("keyboard: key {key} unmapped"),
        }
    }
}

/// The main entry point of the application.
#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    esp_println::logger::init_logger(log::LevelFilter::Debug);

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    info!("Peripherals initialized");

    esp_alloc::heap_allocator!(size: 64 * 1024);

    let timer0 = SystemTimer::new(peripherals.SYSTIMER);
    esp_hal_embassy::init(timer0.alarm0);

    // Keypad wiring: SCL to the board's clock input, SDO is the shared
    // data/interrupt line.
    let scl = Output::new(peripherals.GPIO4, Level::High, OutputConfig::default());
    let sdo = Input::new(peripherals.GPIO5, InputConfig::default());

    let mut keypad = Ttp229::new(scl, sdo, KeyCount::Sixteen, EventMode::Interrupt);
    match keypad.init() {
        Ok(()) => info!("Keypad initialized"),
        Err(err) => warn!("Error initializing keypad: {err:?}"),
    }

    let uart_config = esp_hal::uart::Config::default().with_baudrate(MIDI_BAUD);
    let uart = Uart::new(peripherals.UART1, uart_config)
        .unwrap()
        .with_tx(peripherals.GPIO43)
        .into_async();

    spawner.spawn(dispatch(keypad, uart)).unwrap();

    loop {
        Timer::after(Duration::from_secs(1)).await;
    }
}

/// Waits for keypad events and forwards each one to a single emitter.
#[embassy_executor::task]
async fn dispatch(
    mut keypad: Ttp229<Output<'static>, Input<'static>>,
    uart: Uart<'static, Async>,
) {
    let mut pad = MidiPad::new(uart, LogIndicator::new());
    let mut text = TextInjector;

    loop {
        if let Err(err) = keypad.wait_for_event().await {
            warn!("keypad: edge wait failed: {err:?}");
            continue;
        }

        // One edge can cover several transitions; drain them all before
        // parking again.
        while keypad.has_event() {
            match keypad.button_event() {
                Ok(Some(event)) => match MODE {
                    OperatingMode::Midi => pad.handle(&event).await,
                    OperatingMode::Keyboard => text.handle(&event),
                },
                Ok(None) => break,
                Err(err) => {
                    warn!("keypad: read failed: {err:?}");
                    break;
                }
            }
        }
    }
}
