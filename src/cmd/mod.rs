/*!
Command envelope construction and dispatch.

  command.rs   (Command enum + argument requirements)
  envelope.rs  (Envelope data model + builder)
  params.rs    (--name / --arg / --arg-json / --args-file collection)
  send.rs      (SendArgs + execute_send)

Conventions:
  - `execute_send` is the only entry point main.rs calls.
  - Everything before the connection attempt fails with a serialization error.
*/

pub mod command;
pub mod envelope;
pub mod params;
pub mod send;

pub use send::{SendArgs, execute_send};
