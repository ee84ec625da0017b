//! Host wall clock → device RAM, for the --update-time flag.

use toumapet_system::ToumaPetSystem;

/// Copy the local date and time into the device clock area.
#[cfg(unix)]
pub fn sync_clock(console: &mut ToumaPetSystem) {
    let now = unsafe { libc::time(std::ptr::null_mut()) };
    let mut tm = unsafe { std::mem::zeroed::<libc::tm>() };
    if unsafe { libc::localtime_r(&now, &mut tm) }.is_null() {
        log::warn!("local time unavailable; device clock left alone");
        return;
    }
    console.set_wall_clock(
        ((tm.tm_year + 1900) % 100) as u8,
        (tm.tm_mon + 1) as u8,
        tm.tm_mday as u8,
        tm.tm_hour as u8,
        tm.tm_min as u8,
        tm.tm_sec as u8,
    );
}

#[cfg(not(unix))]
pub fn sync_clock(_console: &mut ToumaPetSystem) {
    log::warn!("--update-time is only supported on unix hosts");
}
