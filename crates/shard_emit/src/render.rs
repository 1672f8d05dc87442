//! Chunk and runtime text.
//!
//! A chunk registers itself by pushing `[names, modules, roots?, required?]`
//! onto the global `self.shardChunks` queue. Each module is a function under
//! its hashed key, paired with a table mapping each import specifier to a
//! module key (sync) or to `[chunk names..., key]` (async). Entry chunks
//! also carry the keys of the modules to start and the names of the shared
//! chunks that must be installed first.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use shard_chunk::{ChunkGraph, ChunkKind};
use shard_common::ChunkId;
use shard_graph::{DependencyKind, Module, ModuleGraph};

/// Global queue chunks push onto; the runtime drains it.
pub const CHUNK_QUEUE: &str = "self.shardChunks";

/// Renders a non-runtime chunk.
pub fn render_chunk(graph: &ModuleGraph, chunks: &ChunkGraph, id: ChunkId) -> String {
    let chunk = chunks.chunk(id);
    let mut out = String::new();
    out.push_str(&format!(
        "({CHUNK_QUEUE} = {CHUNK_QUEUE} || []).push([{}, {{\n",
        json_string_array([chunk.name.as_str()])
    ));
    for (i, &module_id) in chunk.modules.iter().enumerate() {
        let module = graph.module(module_id);
        out.push_str(&format!(
            "{}: [function (module, exports, require) {{\n",
            json_string(&module.key())
        ));
        out.push_str(&module_body(module));
        out.push_str(&format!("\n}}, {}]", dependency_table(graph, chunks, module)));
        out.push_str(if i + 1 < chunk.modules.len() { ",\n" } else { "\n" });
    }
    out.push('}');
    if chunk.kind == ChunkKind::Entry {
        let roots: Vec<String> = chunk.roots.iter().map(|&m| graph.module(m).key()).collect();
        let required: Vec<&str> = chunks
            .required_chunks(id)
            .into_iter()
            .map(|c| chunks.chunk(c).name.as_str())
            .collect();
        out.push_str(&format!(
            ", {}, {}",
            json_string_array(roots.iter().map(String::as_str)),
            json_string_array(required)
        ));
    }
    out.push_str("]);\n");
    out
}

fn module_body(module: &Module) -> String {
    let text = String::from_utf8_lossy(&module.content);
    if module.is_script() {
        text.trim_end().to_string()
    } else {
        format!("module.exports = {};", json_string(&text))
    }
}

fn dependency_table(graph: &ModuleGraph, chunks: &ChunkGraph, module: &Module) -> String {
    let mut table = Map::new();
    for dep in &module.dependencies {
        let key = graph.module(dep.target).key();
        let value = match dep.kind {
            DependencyKind::Sync => Value::String(key),
            DependencyKind::Async => {
                let mut load: Vec<Value> = chunks
                    .load_set(dep.target)
                    .into_iter()
                    .map(|c| Value::String(chunks.chunk(c).name.clone()))
                    .collect();
                load.push(Value::String(key));
                Value::Array(load)
            }
        };
        // A specifier imported both ways keeps its async form.
        match (table.get(&dep.specifier), &value) {
            (Some(Value::Array(_)), Value::String(_)) => {}
            _ => {
                table.insert(dep.specifier.clone(), value);
            }
        }
    }
    Value::Object(table).to_string()
}

fn json_string(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

fn json_string_array<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    Value::Array(items.into_iter().map(|s| Value::String(s.to_string())).collect()).to_string()
}

const RUNTIME_TEMPLATE: &str = r#"(function () {
  var publicPath = __PUBLIC_PATH__;
  var chunkFiles = __CHUNK_FILES__;
  var definitions = {};
  var cache = {};
  var installed = {};
  var loading = {};
  var deferred = [];

  function load(key) {
    if (cache[key]) return cache[key].exports;
    var definition = definitions[key];
    if (!definition) throw new Error("shard: unknown module " + key);
    var module = (cache[key] = { exports: {} });
    var deps = definition[1];
    definition[0].call(module.exports, module, module.exports, function (specifier) {
      var target = deps[specifier];
      if (Array.isArray(target)) {
        return loadAsync(target.slice(0, -1)).then(function () {
          return load(target[target.length - 1]);
        });
      }
      return load(target);
    });
    return module.exports;
  }

  function fetchChunk(name) {
    if (installed[name]) return Promise.resolve();
    if (loading[name]) return loading[name].promise;
    var entry = (loading[name] = {});
    entry.promise = new Promise(function (resolve, reject) {
      entry.resolve = resolve;
      var script = document.createElement("script");
      script.src = publicPath + chunkFiles[name];
      script.onerror = function () {
        delete loading[name];
        reject(new Error("shard: failed to load chunk " + name));
      };
      document.head.appendChild(script);
    });
    return entry.promise;
  }

  function loadAsync(names) {
    return Promise.all(names.map(fetchChunk));
  }

  function runDeferred() {
    deferred = deferred.filter(function (item) {
      var ready = item[1].every(function (name) { return installed[name]; });
      if (ready) item[0].forEach(load);
      return !ready;
    });
  }

  function install(data) {
    var modules = data[1];
    for (var key in modules) definitions[key] = modules[key];
    data[0].forEach(function (name) {
      installed[name] = true;
      if (loading[name]) {
        loading[name].resolve();
        delete loading[name];
      }
    });
    if (data[2]) deferred.push([data[2], data[3] || []]);
    runDeferred();
  }

  var queue = (__QUEUE__ = __QUEUE__ || []);
  queue.forEach(install);
  queue.push = install;
})();
"#;

/// Renders the runtime chunk.
///
/// `chunk_files` maps every on-demand chunk's name to its filename; entry
/// chunks are excluded so editing an entry never changes the runtime.
pub fn render_runtime(public_path: &str, chunk_files: &BTreeMap<String, String>) -> String {
    let files = serde_json::to_string(chunk_files).unwrap_or_else(|_| "{}".to_string());
    RUNTIME_TEMPLATE
        .replace("__PUBLIC_PATH__", &json_string(public_path))
        .replace("__CHUNK_FILES__", &files)
        .replace("__QUEUE__", CHUNK_QUEUE)
}
