#[cfg(test)]
#[path = "slash_commands_test.rs"]
mod tests;

pub struct SlashCommand {
    command: String,
    pub args: Vec<String>,
}

impl SlashCommand {
    pub fn parse(text: &str) -> Option<SlashCommand> {
        let mut args = text
            .split_whitespace()
            .map(|e| return e.to_string())
            .collect::<Vec<String>>();
        if args.is_empty() {
            return None;
        }
        let prefix = args.remove(0);

        let cmd = SlashCommand {
            command: prefix,
            args,
        };
        if cmd.is_quit()
            || cmd.is_help()
            || cmd.is_role()
            || cmd.is_prompts()
            || cmd.is_preset()
            || cmd.is_clear()
            || cmd.is_export()
            || cmd.is_settings()
            || cmd.is_retry()
        {
            return Some(cmd);
        }

        return None;
    }

    pub fn is_quit(&self) -> bool {
        return ["/q", "/quit", "/exit"].contains(&self.command.as_str());
    }

    pub fn is_help(&self) -> bool {
        return ["/h", "/help"].contains(&self.command.as_str());
    }

    pub fn is_role(&self) -> bool {
        return ["/r", "/role"].contains(&self.command.as_str());
    }

    pub fn is_prompts(&self) -> bool {
        return ["/ps", "/prompts"].contains(&self.command.as_str());
    }

    pub fn is_preset(&self) -> bool {
        return ["/p", "/preset"].contains(&self.command.as_str());
    }

    pub fn is_clear(&self) -> bool {
        return ["/clear"].contains(&self.command.as_str());
    }

    pub fn is_export(&self) -> bool {
        return ["/x", "/export"].contains(&self.command.as_str());
    }

    pub fn is_settings(&self) -> bool {
        return ["/s", "/settings"].contains(&self.command.as_str());
    }

    pub fn is_retry(&self) -> bool {
        return ["/retry"].contains(&self.command.as_str());
    }

    /// One based index into the preset menu, as typed after `/p`.
    pub fn preset_index(&self) -> Option<usize> {
        let idx = self.args.first()?.parse::<usize>().ok()?;
        if idx < 1 {
            return None;
        }

        return Some(idx - 1);
    }
}
