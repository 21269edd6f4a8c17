use anyhow::Result;

use devshell_lib::platform::paths::{data_dir, store_dir};
use devshell_lib::platform::platform_triple;

use crate::output::{OutputFormat, print_json, print_stat};

pub fn cmd_info(format: OutputFormat) -> Result<()> {
  let platform = platform_triple();
  let store = store_dir();
  let data = data_dir();

  if format.is_json() {
    return print_json(&serde_json::json!({
      "version": env!("CARGO_PKG_VERSION"),
      "platform": platform,
      "store": store,
      "data": data,
    }));
  }

  println!("devshell {}", env!("CARGO_PKG_VERSION"));
  match platform {
    Some(triple) => print_stat("Platform", &triple),
    None => print_stat("Platform", "unsupported"),
  }
  print_stat("Store", &store.display().to_string());
  print_stat("Data", &data.display().to_string());
  Ok(())
}
