#[allow(unused)]
use crossterm::event::{KeyCode, KeyModifiers};

#[allow(unused_macros)]
macro_rules! key {
    ($ch: literal) => {
        KeyInput::new(KeyCode::Char($ch), KeyModifiers::NONE)
    };
    ($kc: expr) => {
        KeyInput::new($kc, KeyModifiers::NONE)
    };
    ($ch: literal, $km: expr) => {
        KeyInput::new(KeyCode::Char($ch), $km)
    };
    ($kc: expr, $km: expr) => {
        KeyInput::new($kc, $km)
    };
}

#[allow(unused_macros)]
macro_rules! ctl {
    ($ch: literal) => {
        key!($ch, KeyModifiers::CONTROL)
    };
}

#[allow(unused_macros)]
macro_rules! kis {
    ($s: literal) => {
        $s.parse::<KeyInputSet>().unwrap()
    };
    ($s: expr) => {
        $s.parse::<KeyInputSet>().unwrap()
    };
}
