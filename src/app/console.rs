use crate::adapters::{HttpLabwareLookup, InMemoryInventory};
use crate::config::{ConsoleConfig, LookupSource};
use crate::core::grid::build_addresses;
use crate::core::selection::{SelectionController, SelectionEvent};
use crate::core::worklist::{WorklistController, WorklistEvent};
use crate::domain::model::{Address, GridDirection, Labware, SelectableFilter, SelectionMode};
use crate::utils::error::Result;
use crate::utils::validation::validate_required_field;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

const HELP: &str = "\
<barcode> | scan <barcode>   scan labware into the worklist
remove <barcode>              remove labware from the worklist
lock | unlock                 stop or resume accepting scans
list                          show the worklist
select <address>              click a slot on the current labware
ctrl <address>                ctrl-click a slot
range <address>               shift-click a slot
mode <single|multi> [filter]  change selection mode (filter: any, non_empty, empty, none)
reset                         clear the selection
grid                          draw the current labware
quit                          leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Scan(String),
    Remove(String),
    Lock,
    Unlock,
    List,
    Select(Address),
    CtrlSelect(Address),
    SelectTo(Address),
    Mode {
        mode: SelectionMode,
        selectable: Option<SelectableFilter>,
    },
    Reset,
    Grid,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            return Ok(Command::Scan(String::new()));
        };
        let argument = words.next().map(str::to_string);
        let need = |name: &str| {
            argument
                .clone()
                .ok_or_else(|| format!("{} needs an argument", name))
        };

        let command = match first.to_ascii_lowercase().as_str() {
            "scan" => Command::Scan(argument.clone().unwrap_or_default()),
            "remove" | "rm" => Command::Remove(need("remove")?),
            "lock" => Command::Lock,
            "unlock" => Command::Unlock,
            "list" | "ls" => Command::List,
            "select" => Command::Select(need("select")?),
            "ctrl" => Command::CtrlSelect(need("ctrl")?),
            "range" => Command::SelectTo(need("range")?),
            "mode" => Command::Mode {
                mode: need("mode")?.parse()?,
                selectable: words.next().map(SelectableFilter::from_str).transpose()?,
            },
            "reset" => Command::Reset,
            "grid" => Command::Grid,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => Command::Scan(line.to_string()),
        };
        Ok(command)
    }
}

/// One operator session: a worklist plus slot selection on the most recently
/// scanned labware.
pub struct ConsoleSession {
    worklist: WorklistController<Labware>,
    selection: Option<(String, SelectionController)>,
    selectable: SelectableFilter,
    mode: SelectionMode,
    notices: Arc<Mutex<Vec<String>>>,
}

impl ConsoleSession {
    pub fn new(
        mut worklist: WorklistController<Labware>,
        selectable: SelectableFilter,
        mode: SelectionMode,
    ) -> Self {
        let notices = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&notices);
        worklist.on_change(move |items: &[Labware]| {
            let barcodes: Vec<&str> = items
                .iter()
                .map(|labware| labware.barcode.as_str())
                .collect();
            push_notice(&sink, format!("Worklist: [{}]", barcodes.join(", ")));
        });

        Self {
            worklist,
            selection: None,
            selectable,
            mode,
            notices,
        }
    }

    pub fn from_config(config: &ConsoleConfig, start_locked: bool) -> Result<Self> {
        let worklist = match config.lookup.source {
            LookupSource::Inventory => {
                let path = validate_required_field(
                    "lookup.inventory_path",
                    &config.lookup.inventory_path,
                )?;
                let inventory = Arc::new(InMemoryInventory::from_csv_path(path)?);
                tracing::info!("Loaded {} labware from {}", inventory.len(), path);
                let controller = WorklistController::<Labware>::new(inventory.clone());
                match &config.scanner.location_prefix {
                    Some(prefix) => controller.with_location_lookup(prefix.clone(), inventory),
                    None => controller,
                }
            }
            LookupSource::Http => {
                let endpoint = validate_required_field("lookup.endpoint", &config.lookup.endpoint)?;
                let lookup = HttpLabwareLookup::new(endpoint, Some(config.lookup_timeout()))?;
                WorklistController::<Labware>::new(Arc::new(lookup))
            }
        };

        let mut worklist = worklist
            .with_validator(config.barcode_validator()?)
            .with_business_rules(Arc::new(config.labware_rules()));
        if start_locked {
            worklist = worklist.start_locked();
        }

        Ok(Self::new(
            worklist,
            config.selection.selectable,
            config.selection.mode,
        ))
    }

    pub fn worklist(&self) -> &WorklistController<Labware> {
        &self.worklist
    }

    pub fn selection(&self) -> Option<&SelectionController> {
        self.selection.as_ref().map(|(_, selection)| selection)
    }

    /// Runs one command and returns the lines to show the operator.
    pub async fn execute(&mut self, command: Command) -> Vec<String> {
        let mut output = Vec::new();

        match command {
            Command::Scan(barcode) => {
                self.worklist.scan(&barcode).await;
                self.describe_worklist_outcome(&mut output);
            }
            Command::Remove(barcode) => {
                self.worklist.send(WorklistEvent::RemoveLabware(barcode)).await;
                self.describe_worklist_outcome(&mut output);
            }
            Command::Lock => {
                self.worklist.send(WorklistEvent::Lock).await;
                output.push(format!("Worklist is {}", self.worklist.state()));
            }
            Command::Unlock => {
                self.worklist.send(WorklistEvent::Unlock).await;
                output.push(format!("Worklist is {}", self.worklist.state()));
            }
            Command::List => {
                if self.worklist.items().is_empty() {
                    output.push("Worklist is empty".to_string());
                }
                for (index, labware) in self.worklist.items().iter().enumerate() {
                    output.push(format!(
                        "{:>3}. {} ({})",
                        index + 1,
                        labware.barcode,
                        labware.labware_type
                    ));
                }
            }
            Command::Select(address) => {
                self.select(SelectionEvent::SelectSlot(address), &mut output)
            }
            Command::CtrlSelect(address) => {
                self.select(SelectionEvent::CtrlSelectSlot(address), &mut output)
            }
            Command::SelectTo(address) => {
                self.select(SelectionEvent::SelectToSlot(address), &mut output)
            }
            Command::Mode { mode, selectable } => {
                self.mode = mode;
                if let Some(selectable) = selectable {
                    self.selectable = selectable;
                }
                let event = SelectionEvent::ChangeSelectionMode {
                    mode: self.mode,
                    selectable: self.selectable,
                };
                self.select(event, &mut output);
            }
            Command::Reset => self.select(SelectionEvent::ResetSelected, &mut output),
            Command::Grid => output.extend(self.render_grid()),
            Command::Help => output.extend(HELP.lines().map(str::to_string)),
            Command::Quit => {}
        }

        output.extend(self.drain_notices());
        output
    }

    fn describe_worklist_outcome(&mut self, output: &mut Vec<String>) {
        if self.worklist.is_locked() {
            output.push("Worklist is locked".to_string());
        } else if let Some(message) = self.worklist.message() {
            output.push(message);
        }
        self.bind_selection();
    }

    /// Points the selection at the last labware in the worklist.
    fn bind_selection(&mut self) {
        let Some(latest) = self.worklist.items().last() else {
            self.selection = None;
            return;
        };

        if let Some((barcode, selection)) = &mut self.selection {
            if *barcode == latest.barcode {
                selection.send(SelectionEvent::UpdateSlots(latest.grid.slots.clone()));
                return;
            }
        }

        let mut selection =
            SelectionController::new(latest.grid.slots.clone(), self.selectable, self.mode);
        let sink = Arc::clone(&self.notices);
        selection.on_change(move |addresses: &[Address]| {
            push_notice(&sink, format!("Selected: [{}]", addresses.join(", ")));
        });
        self.selection = Some((latest.barcode.clone(), selection));
    }

    fn select(&mut self, event: SelectionEvent, output: &mut Vec<String>) {
        match &mut self.selection {
            Some((_, selection)) => {
                selection.send(event);
                output.push(format!("Selection is {}", selection.state()));
            }
            None => output.push("Scan labware before selecting slots".to_string()),
        }
    }

    fn render_grid(&self) -> Vec<String> {
        let (Some(labware), Some(selection)) = (self.worklist.items().last(), self.selection())
        else {
            return vec!["No labware scanned".to_string()];
        };

        let grid = &labware.grid;
        let addresses = match build_addresses(grid.size(), GridDirection::RightDown) {
            Ok(addresses) => addresses,
            Err(e) => return vec![e.to_string()],
        };

        let mut lines = vec![format!("{} ({})", labware.barcode, labware.labware_type)];
        for row in addresses.chunks(grid.num_columns.max(1) as usize) {
            let cells: Vec<String> = row
                .iter()
                .map(|address| {
                    let occupied = grid.slot(address).is_some_and(|slot| slot.occupied);
                    let mark = match (selection.is_slot_selected(address), occupied) {
                        (true, _) => '*',
                        (false, true) => 'o',
                        (false, false) => '.',
                    };
                    format!("{:>5}{}", address, mark)
                })
                .collect();
            lines.push(cells.join(" "));
        }
        lines
    }

    fn drain_notices(&self) -> Vec<String> {
        match self.notices.lock() {
            Ok(mut notices) => notices.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }
}

fn push_notice(sink: &Mutex<Vec<String>>, notice: String) {
    if let Ok(mut notices) = sink.lock() {
        notices.push(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!("STAN-1".parse::<Command>(), Ok(Command::Scan("STAN-1".to_string())));
        assert_eq!("scan STAN-1".parse::<Command>(), Ok(Command::Scan("STAN-1".to_string())));
        assert_eq!("rm STAN-1".parse::<Command>(), Ok(Command::Remove("STAN-1".to_string())));
        assert_eq!("range B2".parse::<Command>(), Ok(Command::SelectTo("B2".to_string())));
        assert_eq!(
            "mode multi non_empty".parse::<Command>(),
            Ok(Command::Mode {
                mode: SelectionMode::Multi,
                selectable: Some(SelectableFilter::NonEmpty),
            })
        );
        assert_eq!("".parse::<Command>(), Ok(Command::Scan(String::new())));
        assert!("select".parse::<Command>().is_err());
        assert!("mode sometimes".parse::<Command>().is_err());
    }
}
