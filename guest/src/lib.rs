//! Capsule guest component.
//!
//! Exports `capsule:host/task-runner.run` and backs the capsule runtime with
//! the component's imports: `capsule:host/api` for task scheduling and HTTP,
//! `wasi:filesystem` for preopened directories and `wasi:cli` for the
//! environment.
//!
//! Build with `cargo component build -p capsule-guest --target wasm32-wasip2`.

wit_bindgen::generate!({
    world: "capsule-agent",
    path: "wit/world.wit",
});

mod host;

use std::sync::Arc;

use ::capsule::{arg, App, AsyncTask, TaskError, TaskOptions};
use exports::capsule::host::task_runner::Guest;
use lazy_static::lazy_static;
use serde_json::{json, Number, Value};

lazy_static! {
    static ref APP: Result<App, String> = build_app().map_err(|e| e.to_string());
}

fn build_app() -> ::capsule::Result<App> {
    let app = App::new(Arc::new(host::ComponentImports))?;
    define_tasks(&app);
    Ok(app)
}

fn define_tasks(app: &App) {
    let greet = app.task_fn(TaskOptions::new("greet").compute("low"), |args, _| {
        let name: String = arg(&args, 0).unwrap_or_else(|_| "World".to_string());
        Ok(json!(format!("Hello, {}!", name)))
    });

    let add = app.task_fn(
        TaskOptions::new("add").compute("low").timeout("5s"),
        |args, _| {
            let a: Number = arg(&args, 0)?;
            let b: Number = arg(&args, 1)?;
            Ok(add_numbers(&a, &b))
        },
    );

    app.task(
        TaskOptions::new("main").compute("medium").max_retries(1),
        AsyncTask::shared(move |args, _| {
            let greet = greet.clone();
            let add = add.clone();
            async move {
                let name = args.first().cloned().unwrap_or_else(|| json!("World"));
                let greeting = greet.call(vec![name]).await?;
                let sum = add.call(vec![json!(2), json!(3)]).await?;
                Ok::<_, TaskError>(json!({ "greeting": greeting, "sum": sum }))
            }
        }),
    );
}

/// Integer sums stay integers; anything else is added as floats.
fn add_numbers(a: &Number, b: &Number) -> Value {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        if let Some(sum) = a.checked_add(b) {
            return json!(sum);
        }
    }
    let a = a.as_f64().unwrap_or_default();
    let b = b.as_f64().unwrap_or_default();
    json!(a + b)
}

struct TaskRunner;

impl Guest for TaskRunner {
    fn run(args: String) -> Result<String, String> {
        let app = APP.as_ref().map_err(Clone::clone)?;
        futures::executor::block_on(app.run(&args))
    }
}

export!(TaskRunner);
