//! Binding to the simulator's WebAssembly module.
//!
//! The module exports an embind class `Module.DmsApi`. Query methods return
//! embind values; vectors and maps are converted to plain JS arrays and
//! objects before `serde_wasm_bindgen` reads them into the shared types.

use indexmap::IndexSet;
use js_sys::Uint8Array;
use serde::Deserialize;
use shared::{
    ClockInfo, CpuInfo, DisplayInfo, KeyPosition, MachineProfile, RunStatus, SignalDetails,
    SignalInfo, Simulator, SimulatorError,
};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = Module)]
    type DmsApi;

    #[wasm_bindgen(constructor, js_namespace = Module)]
    fn new() -> DmsApi;

    #[wasm_bindgen(method)]
    fn delete(this: &DmsApi);

    #[wasm_bindgen(method, catch)]
    fn launch(this: &DmsApi, machine: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(method)]
    fn stop(this: &DmsApi);

    #[wasm_bindgen(method)]
    fn context_execute(this: &DmsApi) -> bool;

    #[wasm_bindgen(method)]
    fn context_step_instruction(this: &DmsApi);

    #[wasm_bindgen(method)]
    fn context_step_clock(this: &DmsApi);

    #[wasm_bindgen(method)]
    fn context_select_step_clock(this: &DmsApi, signal: &str);

    #[wasm_bindgen(method)]
    fn context_run(this: &DmsApi);

    #[wasm_bindgen(method)]
    fn context_pause(this: &DmsApi);

    #[wasm_bindgen(method)]
    fn context_reset(this: &DmsApi);

    #[wasm_bindgen(method)]
    fn context_status(this: &DmsApi) -> JsValue;

    #[wasm_bindgen(method)]
    fn signal_info(this: &DmsApi) -> JsValue;

    #[wasm_bindgen(method)]
    fn signal_data(this: &DmsApi, domain: Option<u32>) -> JsValue;

    #[wasm_bindgen(method)]
    fn signal_details(this: &DmsApi, signal: &str) -> JsValue;

    #[wasm_bindgen(method)]
    fn cpu_info(this: &DmsApi) -> JsValue;

    #[wasm_bindgen(method)]
    fn clock_info(this: &DmsApi) -> JsValue;

    #[wasm_bindgen(method)]
    fn display_info(this: &DmsApi) -> JsValue;

    #[wasm_bindgen(method)]
    fn display_data(this: &DmsApi) -> JsValue;

    #[wasm_bindgen(method)]
    fn breakpoint_signal_set(this: &DmsApi, signal: &str);

    #[wasm_bindgen(method)]
    fn breakpoint_signal_clear(this: &DmsApi, signal: &str);

    #[wasm_bindgen(method)]
    fn breakpoint_signal_list(this: &DmsApi) -> JsValue;

    #[wasm_bindgen(method)]
    fn keyboard_keys_down(this: &DmsApi) -> JsValue;

    #[wasm_bindgen(method)]
    fn keyboard_key_pressed(this: &DmsApi, row: u8, column: u8);

    #[wasm_bindgen(method)]
    fn keyboard_num_keys_down(this: &DmsApi) -> u32;

    #[wasm_bindgen(method)]
    fn keyboard_set_dwell_time(this: &DmsApi, dwell_ms: u32);
}

#[wasm_bindgen(inline_js = r#"
export function embind_to_plain(value) {
    if (value === null || typeof value !== 'object' || ArrayBuffer.isView(value)) {
        return value;
    }
    if (typeof value.keys === 'function' && typeof value.get === 'function' && typeof value.size === 'function') {
        const keys = value.keys();
        const object = {};
        for (let i = 0; i < keys.size(); i++) {
            const key = keys.get(i);
            object[key] = embind_to_plain(value.get(key));
        }
        keys.delete();
        return object;
    }
    if (typeof value.get === 'function' && typeof value.size === 'function') {
        const array = [];
        for (let i = 0; i < value.size(); i++) {
            array.push(embind_to_plain(value.get(i)));
        }
        return array;
    }
    if (Array.isArray(value)) {
        return value.map(embind_to_plain);
    }
    const object = {};
    for (const [key, item] of Object.entries(value)) {
        object[key] = embind_to_plain(item);
    }
    return object;
}
"#)]
extern "C" {
    fn embind_to_plain(value: &JsValue) -> JsValue;
}

/// Detail record as the module reports it; a negative writer id means the
/// signal has not been written yet.
#[derive(Deserialize)]
struct RawSignalDetails {
    value: u8,
    writer_id: i32,
    #[serde(default)]
    writer_name: String,
}

impl From<RawSignalDetails> for SignalDetails {
    fn from(raw: RawSignalDetails) -> Self {
        SignalDetails {
            value: raw.value != 0,
            writer_name: (raw.writer_id >= 0).then_some(raw.writer_name),
        }
    }
}

fn decode<T: for<'de> Deserialize<'de>>(
    query: &'static str,
    value: JsValue,
) -> Result<T, SimulatorError> {
    if value.is_undefined() || value.is_null() {
        return Err(SimulatorError::malformed(query, "no result"));
    }
    serde_wasm_bindgen::from_value(embind_to_plain(&value))
        .map_err(|err| SimulatorError::malformed(query, err))
}

fn bytes(query: &'static str, value: JsValue) -> Result<Vec<u8>, SimulatorError> {
    if !value.is_object() {
        return Err(SimulatorError::malformed(query, "expected a byte array"));
    }
    Ok(Uint8Array::new(&value).to_vec())
}

/// One simulator session inside the loaded module.
pub struct DmsSimulator {
    api: DmsApi,
    launched: bool,
}

impl DmsSimulator {
    pub fn create() -> Self {
        Self {
            api: DmsApi::new(),
            launched: false,
        }
    }

    fn require_launch(&self) -> Result<(), SimulatorError> {
        if self.launched {
            Ok(())
        } else {
            Err(SimulatorError::NotLaunched)
        }
    }
}

impl Drop for DmsSimulator {
    fn drop(&mut self) {
        self.api.delete();
    }
}

impl Simulator for DmsSimulator {
    fn launch(&mut self, profile: MachineProfile) -> Result<(), SimulatorError> {
        self.api
            .launch(profile.launch_id())
            .map_err(|err| SimulatorError::Rejected {
                command: "launch",
                message: err.as_string().unwrap_or_else(|| format!("{err:?}")),
            })?;
        self.launched = true;
        Ok(())
    }

    fn stop(&mut self) {
        if self.launched {
            self.api.stop();
            self.launched = false;
        }
    }

    fn execute_quantum(&mut self) -> bool {
        self.launched && self.api.context_execute()
    }

    fn step_instruction(&mut self) {
        self.api.context_step_instruction();
    }

    fn step_clock(&mut self) {
        self.api.context_step_clock();
    }

    fn select_clock_signal(&mut self, name: &str) {
        self.api.context_select_step_clock(name);
    }

    fn run(&mut self) {
        self.api.context_run();
    }

    fn pause(&mut self) {
        self.api.context_pause();
    }

    fn reset(&mut self) {
        self.api.context_reset();
    }

    fn status(&self) -> Result<RunStatus, SimulatorError> {
        self.require_launch()?;
        self.api
            .context_status()
            .as_string()
            .map(|label| RunStatus::from_label(&label))
            .ok_or_else(|| SimulatorError::malformed("status", "expected a string"))
    }

    fn signal_info(&self) -> Result<SignalInfo, SimulatorError> {
        self.require_launch()?;
        decode("signal_info", self.api.signal_info())
    }

    fn signal_data(&self, domain: Option<u32>) -> Result<Vec<u8>, SimulatorError> {
        self.require_launch()?;
        bytes("signal_data", self.api.signal_data(domain))
    }

    fn signal_details(&self, name: &str) -> Result<SignalDetails, SimulatorError> {
        self.require_launch()?;
        let raw: RawSignalDetails = decode("signal_details", self.api.signal_details(name))?;
        Ok(raw.into())
    }

    fn cpu_info(&self) -> Result<CpuInfo, SimulatorError> {
        self.require_launch()?;
        decode("cpu_info", self.api.cpu_info())
    }

    fn clock_info(&self) -> Result<ClockInfo, SimulatorError> {
        self.require_launch()?;
        decode("clock_info", self.api.clock_info())
    }

    fn display_info(&self) -> Result<DisplayInfo, SimulatorError> {
        self.require_launch()?;
        decode("display_info", self.api.display_info())
    }

    fn display_data(&self) -> Result<Vec<u8>, SimulatorError> {
        self.require_launch()?;
        bytes("display_data", self.api.display_data())
    }

    fn breakpoint_signal_set(&mut self, name: &str) {
        self.api.breakpoint_signal_set(name);
    }

    fn breakpoint_signal_clear(&mut self, name: &str) {
        self.api.breakpoint_signal_clear(name);
    }

    fn breakpoint_signal_list(&self) -> Result<IndexSet<String>, SimulatorError> {
        self.require_launch()?;
        let names: Vec<String> = decode("breakpoint_signal_list", self.api.breakpoint_signal_list())?;
        Ok(names.into_iter().collect())
    }

    fn keys_down(&self) -> Result<Vec<KeyPosition>, SimulatorError> {
        self.require_launch()?;
        decode("keys_down", self.api.keyboard_keys_down())
    }

    fn key_pressed(&mut self, key: KeyPosition) {
        self.api.keyboard_key_pressed(key.row, key.column);
    }

    fn num_keys_down(&self) -> Result<usize, SimulatorError> {
        self.require_launch()?;
        Ok(self.api.keyboard_num_keys_down() as usize)
    }

    fn set_dwell_time(&mut self, dwell_ms: u32) {
        self.api.keyboard_set_dwell_time(dwell_ms);
    }
}
