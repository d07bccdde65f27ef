#![no_std]
#![no_main]

use defmt_rtt as _;
use panic_probe as _;
use rtic::app;

#[app(device = rp_pico::hal::pac, peripherals = true, dispatchers = [I2C0_IRQ])]
mod app {
    use embedded_hal::digital::v2::ToggleableOutputPin;
    use heapless::Vec;
    use mrbus_clock::config::{BUS_BAUD, LOGICAL_TICK_HZ};
    use mrbus_clock::packet::{MAX_PACKET_LEN, PKT_LEN, TIME_PACKET_TYPE};
    use mrbus_clock::{BusPacket, ClockSync, ClockTime, DisplayMode, TickDivider, TICK_PROFILE};
    use rp_pico::hal::{
        clocks::{init_clocks_and_plls, Clock},
        fugit::{ExtU32, RateExtU32},
        gpio::{bank0, FunctionSio, FunctionUart, Pin, PullDown, SioOutput},
        sio::Sio,
        timer::{Alarm, Alarm0, Timer},
        uart::{DataBits, Enabled, StopBits, UartConfig, UartPeripheral},
        watchdog::Watchdog,
    };

    type UartPins = (
        Pin<bank0::Gpio0, FunctionUart, PullDown>,
        Pin<bank0::Gpio1, FunctionUart, PullDown>,
    );
    type BusUart = UartPeripheral<Enabled, rp_pico::hal::pac::UART0, UartPins>;
    type LedPin = Pin<bank0::Gpio25, FunctionSio<SioOutput>, PullDown>;

    // Shared resources (accessed by multiple tasks)
    #[shared]
    struct Shared {
        clock: ClockSync,
    }

    // Local resources (accessed by single tasks)
    #[local]
    struct Local {
        alarm: Alarm0,
        divider: TickDivider,
        ticks_to_report: u32,
        uart: BusUart,
        rx: Vec<u8, MAX_PACKET_LEN>,
        led: LedPin,
    }

    #[init]
    fn init(ctx: init::Context) -> (Shared, Local, init::Monotonics) {
        let mut pac = ctx.device;
        let mut watchdog = Watchdog::new(pac.WATCHDOG);
        let sio = Sio::new(pac.SIO);

        let external_xtal_freq_hz = 12_000_000u32;
        let clocks = init_clocks_and_plls(
            external_xtal_freq_hz,
            pac.XOSC,
            pac.CLOCKS,
            pac.PLL_SYS,
            pac.PLL_USB,
            &mut pac.RESETS,
            &mut watchdog,
        )
        .ok()
        .unwrap();

        // Arm the periodic tick
        let mut timer = Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);
        let mut alarm = timer.alarm_0().unwrap();
        alarm.schedule(TICK_PROFILE.period_us().micros()).unwrap();
        alarm.enable_interrupt();

        let pins = rp_pico::Pins::new(
            pac.IO_BANK0,
            pac.PADS_BANK0,
            sio.gpio_bank0,
            &mut pac.RESETS,
        );

        let led = pins.led.into_push_pull_output();

        let uart_pins = (
            pins.gpio0.into_function::<FunctionUart>(),
            pins.gpio1.into_function::<FunctionUart>(),
        );
        let mut uart = UartPeripheral::new(pac.UART0, uart_pins, &mut pac.RESETS)
            .enable(
                UartConfig::new(BUS_BAUD.Hz(), DataBits::Eight, None, StopBits::One),
                clocks.peripheral_clock.freq(),
            )
            .unwrap();
        uart.enable_rx_interrupt();

        defmt::info!(
            "tick timer {=u32} Hz / {=u8}",
            TICK_PROFILE.interrupt_hz,
            TICK_PROFILE.ticks_per_decisec
        );

        (
            Shared {
                clock: ClockSync::new(),
            },
            Local {
                alarm,
                divider: TickDivider::from_profile(TICK_PROFILE),
                ticks_to_report: LOGICAL_TICK_HZ,
                uart,
                rx: Vec::new(),
                led,
            },
            init::Monotonics(),
        )
    }

    // Hardware Task: physical tick interrupt, divided down to 10 Hz
    #[task(binds = TIMER_IRQ_0, priority = 2, shared = [clock], local = [alarm, divider, ticks_to_report])]
    fn timer_tick(mut ctx: timer_tick::Context) {
        ctx.local.alarm.clear_interrupt();
        ctx.local.alarm.schedule(TICK_PROFILE.period_us().micros()).unwrap();

        if !ctx.local.divider.on_interrupt() {
            return;
        }

        ctx.shared.clock.lock(|c| c.tick());

        *ctx.local.ticks_to_report -= 1;
        if *ctx.local.ticks_to_report == 0 {
            *ctx.local.ticks_to_report = LOGICAL_TICK_HZ;
            report::spawn().ok();
        }
    }

    // Hardware Task: bytes from the bus interface. The lock masks the tick
    // interrupt for the whole packet update.
    #[task(binds = UART0_IRQ, priority = 1, shared = [clock], local = [uart, rx])]
    fn uart_rx(mut ctx: uart_rx::Context) {
        let rx = ctx.local.rx;
        let mut byte = [0u8; 1];

        loop {
            match ctx.local.uart.read_raw(&mut byte) {
                Ok(1) => {}
                _ => break,
            }
            if rx.push(byte[0]).is_err() {
                defmt::warn!("bus packet overran {=usize} bytes", MAX_PACKET_LEN);
                rx.clear();
                continue;
            }
            if rx.len() <= PKT_LEN || rx.len() < rx[PKT_LEN] as usize {
                continue;
            }

            match BusPacket::from_bytes(&rx[..]) {
                Ok(pkt) if pkt.packet_type() == TIME_PACKET_TYPE => {
                    let accepted = ctx.shared.clock.lock(|c| c.process_time_packet(&pkt));
                    if !accepted {
                        defmt::debug!("time packet from {=u8} filtered", pkt.src());
                    }
                }
                Ok(_) => {}
                Err(e) => defmt::warn!("dropping bus packet: {}", e),
            }
            rx.clear();
        }
    }

    // Software Task: log the clock once per second
    #[task(shared = [clock], local = [led])]
    fn report(mut ctx: report::Context) {
        ctx.local.led.toggle().unwrap();

        let (mode, fresh, time) = ctx.shared.clock.lock(|c| {
            let mut time = ClockTime::default();
            let fresh = match c.display_mode() {
                DisplayMode::FastTime | DisplayMode::FastHold => c.get_fast_time(&mut time),
                _ => c.get_real_time(&mut time),
            };
            (c.display_mode(), fresh, time)
        });

        if fresh {
            defmt::info!("{} {}", mode, time);
        } else {
            defmt::warn!("time source timed out");
        }
    }
}
