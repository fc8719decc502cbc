//! WebAssembly bindings for the emulator.
//!
//! Structured values cross the boundary as JSON strings.

use crate::Emulator;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly emulator wrapper.
#[wasm_bindgen]
pub struct WasmEmulator {
    emu: Emulator,
}

#[wasm_bindgen]
impl WasmEmulator {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            emu: Emulator::new(),
        }
    }

    /// Load assembly source. Returns false and keeps the old program on error.
    #[wasm_bindgen(js_name = loadProgram)]
    pub fn load_program(&mut self, source: &str) -> bool {
        self.emu.load(source).is_ok()
    }

    /// Describe why `source` does not load, or `None` if it does.
    #[wasm_bindgen(js_name = checkProgram)]
    pub fn check_program(&self, source: &str) -> Option<String> {
        crate::asm::assemble(source, self.emu.config())
            .err()
            .map(|err| err.to_string())
    }

    /// Step one instruction. Returns the step record as JSON, or `None` once halted.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<Option<String>, JsError> {
        match self.emu.step()? {
            Some(record) => Ok(Some(serde_json::to_string(&record)?)),
            None => Ok(None),
        }
    }

    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.emu.reset();
    }

    /// Whole machine state as JSON.
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> Result<String, JsError> {
        Ok(serde_json::to_string(&self.emu.state())?)
    }

    #[wasm_bindgen(js_name = isHalted)]
    pub fn is_halted(&self) -> bool {
        self.emu.is_halted()
    }
}

impl Default for WasmEmulator {
    fn default() -> Self {
        Self::new()
    }
}
