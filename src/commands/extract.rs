//! `tracklink extract` command.

use crate::keys;

/// Print every work item id in `text`, one per line, in order of appearance.
pub fn run(text: &str) {
    for id in keys::find_all(text) {
        println!("{id}");
    }
}
