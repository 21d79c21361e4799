use thiserror::Error;

/// Where a call to a C function is redirected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// `noarch.Printf`, `math.Sin`, or a bare Go function name.
    Function {
        package: Option<String>,
        name: String,
    },
    /// `_`: the call is dropped and its arguments are discarded.
    Discard,
}

impl Target {
    fn parse(text: &str) -> Target {
        if text == "_" {
            return Target::Discard;
        }
        match text.rsplit_once('.') {
            Some((package, name)) => Target::Function {
                package: Some(package.to_string()),
                name: name.to_string(),
            },
            None => Target::Function {
                package: None,
                name: text.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: String,
    pub return_c_type: String,
    pub parameter_c_types: Vec<String>,
    pub variadic: bool,
    pub substitution: Option<Target>,
    /// Call results in order. `0` is the C return value, `N` assigns to argument `N`.
    pub return_positions: Option<Vec<i32>>,
    /// Call arguments in order. `N` passes argument `N`, `-N` its address.
    pub parameter_positions: Option<Vec<i32>>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("bad function definition `{line}`: {reason}")]
pub struct SignatureError {
    pub line: String,
    pub reason: String,
}

impl FunctionSignature {
    /// A signature without substitution, as found in a declaration.
    pub fn declared(name: &str, return_c_type: &str, parameter_c_types: Vec<String>, variadic: bool) -> Self {
        Self {
            name: name.to_string(),
            return_c_type: return_c_type.to_string(),
            parameter_c_types,
            variadic,
            substitution: None,
            return_positions: None,
            parameter_positions: None,
        }
    }

    /// Parse one table line:
    ///
    /// ```text
    /// int fread(void *, int, int, FILE *) -> $0 = noarch.Fread(&1, $2, $3, $4)
    /// double sin(double) -> math.Sin
    /// ```
    pub fn parse(line: &str) -> Result<Self, SignatureError> {
        let err = |reason: &str| SignatureError {
            line: line.to_string(),
            reason: reason.to_string(),
        };

        let (head, tail) = match line.split_once(" -> ") {
            Some((head, tail)) => (head.trim(), Some(tail.trim())),
            None => (line.trim(), None),
        };

        let open = head.find('(').ok_or_else(|| err("missing parameter list"))?;
        let params = head[open..]
            .strip_prefix('(')
            .and_then(|p| p.strip_suffix(')'))
            .ok_or_else(|| err("unbalanced parameter list"))?;
        let (ret, name) = head[..open]
            .trim_end()
            .rsplit_once(' ')
            .ok_or_else(|| err("missing return type"))?;
        let stars = name.len() - name.trim_start_matches('*').len();
        let name = name.trim_start_matches('*');
        if name.is_empty() {
            return Err(err("missing function name"));
        }
        let return_c_type = match stars {
            0 => ret.trim().to_string(),
            n => format!("{} {}", ret.trim(), "*".repeat(n)),
        };

        let mut variadic = false;
        let mut parameter_c_types = vec![];
        for p in params.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if p == "..." {
                variadic = true;
            } else {
                parameter_c_types.push(p.to_string());
            }
        }

        let mut sig = Self::declared(name, &return_c_type, parameter_c_types, variadic);
        let Some(tail) = tail else {
            return Ok(sig);
        };

        let (returns, call) = match tail.split_once(" = ") {
            Some((returns, call)) => (Some(returns), call),
            None => (None, tail),
        };
        let (target, args) = match call.find('(') {
            Some(open) => {
                let args = call[open + 1..]
                    .strip_suffix(')')
                    .ok_or_else(|| err("unbalanced argument list"))?;
                (&call[..open], Some(args))
            }
            None => (call, None),
        };
        sig.substitution = Some(Target::parse(target.trim()));
        if let Some(returns) = returns {
            sig.return_positions = Some(positions(returns).map_err(|r| err(&r))?);
        }
        if let Some(args) = args {
            sig.parameter_positions = Some(positions(args).map_err(|r| err(&r))?);
        }
        Ok(sig)
    }

    pub fn is_substituted(&self) -> bool {
        self.substitution.is_some()
    }
}

/// `$1, &2` becomes `[1, -2]`.
fn positions(text: &str) -> Result<Vec<i32>, String> {
    text.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            let (sign, digits) = if let Some(d) = t.strip_prefix('$') {
                (1, d)
            } else if let Some(d) = t.strip_prefix('&') {
                (-1, d)
            } else {
                return Err(format!("`{}` is not a position", t));
            };
            digits
                .parse::<i32>()
                .map(|n| sign * n)
                .map_err(|_| format!("`{}` is not a position", t))
        })
        .collect()
}
