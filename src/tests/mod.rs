mod helper;
mod invalid_json;
mod revisions;
mod shares;
